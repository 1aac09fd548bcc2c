use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use log::trace;

use crate::error::Error;
use crate::operation::OpCtx;
use crate::point::Point;
use crate::segment::Segment;
use crate::sweep_event::{leftmost_compare, sweep_event_compare, SweepEvent};
use crate::vector::compare_angles;
use crate::Geom;

/// An output ring: the closed chain of sweep events walked out of the
/// surviving segments. Whether it is an exterior ring or a hole is derived
/// lazily from the nesting structure.
#[derive(Debug)]
pub(crate) struct RingOut {
    events: Vec<Rc<SweepEvent>>,
    pub poly: RefCell<Option<Weak<PolyOut>>>,
    is_exterior_ring: Cell<Option<bool>>,
    enclosing_ring: RefCell<Option<Option<Rc<RingOut>>>>,
}

#[derive(Debug)]
pub(crate) struct PolyOut {
    exterior_ring: Rc<RingOut>,
    interior_rings: RefCell<Vec<Rc<RingOut>>>,
}

#[derive(Debug)]
pub(crate) struct MultiPolyOut {
    polys: Vec<Rc<PolyOut>>,
}

impl RingOut {
    fn new(events: Vec<Rc<SweepEvent>>) -> Rc<RingOut> {
        let ring = Rc::new(RingOut {
            events,
            poly: RefCell::new(None),
            is_exterior_ring: Cell::new(None),
            enclosing_ring: RefCell::new(None),
        });
        for event in &ring.events {
            *event.segment().ring_out.borrow_mut() = Some(Rc::downgrade(&ring));
        }
        ring
    }

    /// Walk every surviving segment into closed rings.
    ///
    /// From each unplaced in-result segment, follow `other` links point to
    /// point, picking the left-most available continuation at intersection
    /// vertices. Re-visiting an intersection vertex means the events since
    /// that visit close a loop of their own; they are spliced off as a
    /// separate ring.
    pub fn factory(
        all_segments: &[Rc<Segment>],
        ctx: &OpCtx,
    ) -> Result<Vec<Rc<RingOut>>, Error> {
        let mut rings_out = Vec::new();

        for segment in all_segments {
            if !segment.is_in_result(ctx) || segment.ring_out().is_some() {
                continue;
            }

            let mut prev_event;
            let mut event = segment.left_se();
            let mut next_event = segment.right_se();
            let mut events = vec![event.clone()];

            let starting_point = event.point.clone();
            let mut intersection_les: Vec<(usize, Rc<Point>)> = Vec::new();

            trace!(
                "starting ring walk at [{}, {}]",
                starting_point.x,
                starting_point.y
            );

            loop {
                prev_event = event.clone();
                event = next_event.clone();
                events.push(event.clone());

                // ring complete?
                if Rc::ptr_eq(&event.point, &starting_point) {
                    break;
                }

                loop {
                    let available = event.get_available_linked_events(ctx);

                    // a dead end here means an earlier phase misbehaved
                    if available.is_empty() {
                        let first_pt = events[0].point.clone();
                        let last_pt = events[events.len() - 1].point.clone();
                        return Err(Error::Internal(format!(
                            "Unable to complete output ring starting at [{}, {}]. \
                             Last matching segment found ends at [{}, {}].",
                            first_pt.x, first_pt.y, last_pt.x, last_pt.y
                        )));
                    }

                    // only one way to go: continue on the path
                    if available.len() == 1 {
                        next_event = available[0].other();
                        break;
                    }

                    // an intersection vertex. have we been here before?
                    let revisit = intersection_les
                        .iter()
                        .position(|(_, pt)| Rc::ptr_eq(pt, &event.point));

                    if let Some(idx) = revisit {
                        // the events since the earlier visit close a loop;
                        // cut them off as their own ring
                        let (cut_index, _) = intersection_les[idx].clone();
                        intersection_les.truncate(idx);

                        let mut ring_events = events.split_off(cut_index);
                        let first_other = ring_events[0].other();
                        ring_events.insert(0, first_other);
                        ring_events.reverse();
                        rings_out.push(RingOut::new(ring_events));
                        continue;
                    }

                    intersection_les.push((events.len(), event.point.clone()));

                    // take the left-most turn relative to where we came from
                    let mut ranked: Vec<_> = available
                        .iter()
                        .map(|le| (le.clone(), event.angles_via(&prev_event, le)))
                        .collect();
                    ranked.sort_by(|a, b| leftmost_compare(&a.1, &b.1));
                    next_event = ranked[0].0.other();
                    break;
                }
            }

            rings_out.push(RingOut::new(events));
        }
        Ok(rings_out)
    }

    /// The ring's coordinates: colinear interior points removed, exterior
    /// rings counter-clockwise, holes clockwise, first point repeated last.
    /// `None` when the ring collapsed to colinear points.
    pub fn get_geom(self: &Rc<Self>, ctx: &OpCtx) -> Option<Vec<Vec<f64>>> {
        // drop superfluous points along straight lines
        let mut prev_pt = self.events[0].point.clone();
        let mut points = vec![prev_pt.clone()];
        for i in 1..self.events.len().saturating_sub(1) {
            let pt = self.events[i].point.clone();
            let next_pt = self.events[i + 1].point.clone();
            if compare_angles(pt.xy(), prev_pt.xy(), next_pt.xy()) == Ordering::Equal {
                continue;
            }
            points.push(pt.clone());
            prev_pt = pt;
        }

        // ring was all (within rounding error of the angle check) colinear
        if points.len() == 1 {
            return None;
        }

        // the starting point may itself be superfluous
        let pt = points[0].clone();
        let next_pt = points[1].clone();
        if compare_angles(pt.xy(), prev_pt.xy(), next_pt.xy()) == Ordering::Equal {
            points.remove(0);
        }
        points.push(points[0].clone());

        if self.is_exterior_ring(ctx) {
            Some(points.iter().map(|p| vec![p.x, p.y]).collect())
        } else {
            Some(points.iter().rev().map(|p| vec![p.x, p.y]).collect())
        }
    }

    /// A ring enclosed by a hole is an exterior ring of its own polygon;
    /// one enclosed by an exterior ring is a hole. Top-level rings are
    /// exterior.
    pub fn is_exterior_ring(self: &Rc<Self>, ctx: &OpCtx) -> bool {
        if let Some(cached) = self.is_exterior_ring.get() {
            return cached;
        }
        let result = match self.enclosing_ring(ctx) {
            Some(enclosing) => !enclosing.is_exterior_ring(ctx),
            None => true,
        };
        self.is_exterior_ring.set(Some(result));
        result
    }

    pub fn enclosing_ring(self: &Rc<Self>, ctx: &OpCtx) -> Option<Rc<RingOut>> {
        if let Some(cached) = self.enclosing_ring.borrow().clone() {
            return cached;
        }
        let result = self.calc_enclosing_ring(ctx);
        *self.enclosing_ring.borrow_mut() = Some(result.clone());
        result
    }

    fn calc_enclosing_ring(self: &Rc<Self>, ctx: &OpCtx) -> Option<Rc<RingOut>> {
        // start from the earliest sweep event so the prev chain can't lead
        // us inside one of our own loops
        let mut leftmost_evt = self.events[0].clone();
        for evt in &self.events[1..] {
            if sweep_event_compare(&leftmost_evt, evt) == Ordering::Greater {
                leftmost_evt = evt.clone();
            }
        }

        let mut prev_seg = leftmost_evt.segment().prev_in_result(ctx);
        let mut prev_prev_seg = match &prev_seg {
            Some(p) => p.prev_in_result(ctx),
            None => None,
        };

        loop {
            // no segment below us: nothing encloses us
            let prev = prev_seg.clone()?;

            // nothing below the prev segment: its ring loops around us
            let Some(prev_prev) = prev_prev_seg.clone() else {
                return prev.ring_out();
            };

            let prev_ring = prev
                .ring_out()
                .expect("segment in result but in no output ring");
            let prev_prev_ring = prev_prev
                .ring_out()
                .expect("segment in result but in no output ring");

            // different rings below us: the prev ring either encloses us or
            // is our peer inside its own enclosure
            if !Rc::ptr_eq(&prev_prev_ring, &prev_ring) {
                let prev_prev_enclosing = prev_prev_ring.enclosing_ring(ctx);
                let encloses_prev = matches!(
                    &prev_prev_enclosing,
                    Some(r) if Rc::ptr_eq(r, &prev_ring)
                );
                return if !encloses_prev {
                    Some(prev_ring)
                } else {
                    prev_ring.enclosing_ring(ctx)
                };
            }

            // both from the same ring: a peninsula of it; keep searching
            // downward
            prev_seg = prev_prev.prev_in_result(ctx);
            prev_prev_seg = match &prev_seg {
                Some(p) => p.prev_in_result(ctx),
                None => None,
            };
        }
    }
}

impl PolyOut {
    fn new(exterior_ring: Rc<RingOut>) -> Rc<PolyOut> {
        let poly = Rc::new(PolyOut {
            exterior_ring: exterior_ring.clone(),
            interior_rings: RefCell::new(Vec::new()),
        });
        *exterior_ring.poly.borrow_mut() = Some(Rc::downgrade(&poly));
        poly
    }

    fn add_interior(self: &Rc<Self>, ring: Rc<RingOut>) {
        *ring.poly.borrow_mut() = Some(Rc::downgrade(self));
        self.interior_rings.borrow_mut().push(ring);
    }

    /// `None` when the exterior ring collapsed; collapsed holes are simply
    /// skipped.
    fn get_geom(&self, ctx: &OpCtx) -> Option<Vec<Vec<Vec<f64>>>> {
        let exterior = self.exterior_ring.get_geom(ctx)?;
        let mut geom = vec![exterior];
        for ring in self.interior_rings.borrow().iter() {
            if let Some(ring_geom) = ring.get_geom(ctx) {
                geom.push(ring_geom);
            }
        }
        Some(geom)
    }
}

impl MultiPolyOut {
    pub fn new(rings: Vec<Rc<RingOut>>, ctx: &OpCtx) -> MultiPolyOut {
        let polys = MultiPolyOut::compose_polys(&rings, ctx);
        MultiPolyOut { polys }
    }

    pub fn get_geom(&self, ctx: &OpCtx) -> Geom {
        let mut geom = Vec::new();
        for poly in &self.polys {
            if let Some(poly_geom) = poly.get_geom(ctx) {
                geom.push(poly_geom);
            }
        }
        geom
    }

    /// Exterior rings each found a polygon; holes attach to their enclosing
    /// ring's polygon, creating it on demand.
    fn compose_polys(rings: &[Rc<RingOut>], ctx: &OpCtx) -> Vec<Rc<PolyOut>> {
        let mut polys = Vec::new();
        for ring in rings {
            if ring.poly.borrow().is_some() {
                continue;
            }
            if ring.is_exterior_ring(ctx) {
                polys.push(PolyOut::new(ring.clone()));
            } else {
                let enclosing = ring
                    .enclosing_ring(ctx)
                    .expect("hole with no enclosing ring");
                if enclosing.poly.borrow().is_none() {
                    polys.push(PolyOut::new(enclosing.clone()));
                }
                let poly = enclosing
                    .poly
                    .borrow()
                    .clone()
                    .and_then(|w| w.upgrade())
                    .expect("enclosing ring with no polygon");
                poly.add_interior(ring.clone());
            }
        }
        polys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom_in::InputGeometry;
    use crate::operation::OpType;
    use crate::rounder::PtRounder;
    use crate::segment::SegmentArena;
    use crate::sweep_line::SweepLine;

    /// Run input construction and the sweep, then hand back everything the
    /// output phase needs.
    fn sweep(op_type: OpType, geoms: &[Vec<Vec<Vec<Vec<f64>>>>]) -> (Vec<Rc<Segment>>, OpCtx) {
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let mut input = InputGeometry::default();
        let mut ids = Vec::new();
        for (i, geom) in geoms.iter().enumerate() {
            ids.push(
                input
                    .add_multi_poly(geom, i == 0, &rounder, &arena)
                    .unwrap(),
            );
        }
        let num_multi_polys = ids.len();

        let mut sl = SweepLine::new();
        for id in ids {
            for event in input.sweep_events(id) {
                sl.queue_insert(&event);
            }
        }
        while let Some(event) = sl.pop_first() {
            let new_events = sl.process(&event, &rounder, &arena).unwrap();
            for evt in new_events {
                if !evt.is_consumed() {
                    sl.queue_insert(&evt);
                }
            }
        }

        let ctx = OpCtx {
            op_type,
            num_multi_polys,
            input,
        };
        (sl.segments, ctx)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Vec<f64>> {
        vec![
            vec![x0, y0],
            vec![x0 + size, y0],
            vec![x0 + size, y0 + size],
            vec![x0, y0 + size],
            vec![x0, y0],
        ]
    }

    #[test]
    fn single_square_union_emits_one_ccw_ring() {
        let (segments, ctx) = sweep(OpType::Union, &[vec![vec![square(0.0, 0.0, 1.0)]]]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        assert_eq!(rings.len(), 1);
        assert!(rings[0].is_exterior_ring(&ctx));
        assert!(rings[0].enclosing_ring(&ctx).is_none());

        let geom = rings[0].get_geom(&ctx).unwrap();
        assert_eq!(geom.len(), 5);
        assert_eq!(geom[0], geom[geom.len() - 1]);
        assert!(signed_area(&geom) > 0.0);
    }

    #[test]
    fn hole_ring_is_nested_and_cw() {
        // a square with a hole, unioned with nothing
        let poly = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        let (segments, ctx) = sweep(OpType::Union, &[vec![poly]]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        assert_eq!(rings.len(), 2);

        let exterior = rings
            .iter()
            .find(|r| r.is_exterior_ring(&ctx))
            .unwrap()
            .clone();
        let hole = rings
            .iter()
            .find(|r| !r.is_exterior_ring(&ctx))
            .unwrap()
            .clone();
        assert!(Rc::ptr_eq(&hole.enclosing_ring(&ctx).unwrap(), &exterior));

        assert!(signed_area(&exterior.get_geom(&ctx).unwrap()) > 0.0);
        assert!(signed_area(&hole.get_geom(&ctx).unwrap()) < 0.0);
    }

    #[test]
    fn compose_attaches_holes_to_their_polygon() {
        let poly = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        let (segments, ctx) = sweep(OpType::Union, &[vec![poly]]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        let result = MultiPolyOut::new(rings, &ctx);
        let geom = result.get_geom(&ctx);
        assert_eq!(geom.len(), 1);
        assert_eq!(geom[0].len(), 2);
    }

    #[test]
    fn colinear_points_are_dropped() {
        // an extra vertex in the middle of the bottom edge
        let ring = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 2.0],
            vec![0.0, 2.0],
            vec![0.0, 0.0],
        ];
        let (segments, ctx) = sweep(OpType::Union, &[vec![vec![ring]]]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        let geom = rings[0].get_geom(&ctx).unwrap();
        assert_eq!(geom.len(), 5);
        assert!(!geom.contains(&vec![1.0, 0.0]));
    }

    #[test]
    fn separate_squares_make_separate_rings() {
        let a = vec![vec![square(0.0, 0.0, 1.0)]];
        let b = vec![vec![square(3.0, 3.0, 1.0)]];
        let (segments, ctx) = sweep(OpType::Union, &[a, b]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.is_exterior_ring(&ctx)));

        let result = MultiPolyOut::new(rings, &ctx);
        assert_eq!(result.get_geom(&ctx).len(), 2);
    }

    #[test]
    fn intersection_of_disjoint_squares_has_no_rings() {
        let a = vec![vec![square(0.0, 0.0, 1.0)]];
        let b = vec![vec![square(3.0, 3.0, 1.0)]];
        let (segments, ctx) = sweep(OpType::Intersection, &[a, b]);
        let rings = RingOut::factory(&segments, &ctx).unwrap();
        assert!(rings.is_empty());
    }

    fn signed_area(ring: &[Vec<f64>]) -> f64 {
        let mut area = 0.0;
        for window in ring.windows(2) {
            area += window[0][0] * window[1][1] - window[1][0] * window[0][1];
        }
        area / 2.0
    }
}
