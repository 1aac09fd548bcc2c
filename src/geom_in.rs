use std::rc::Rc;

use crate::bbox::Bbox;
use crate::error::Error;
use crate::rounder::PtRounder;
use crate::segment::{Segment, SegmentArena};
use crate::sweep_event::SweepEvent;
use crate::vector::V2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RingId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PolyId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MultiPolyId(pub usize);

/// An input ring: a closed loop of segments, exterior or hole, belonging to
/// one polygon. Immutable once constructed.
#[derive(Debug)]
pub(crate) struct RingIn {
    pub poly: PolyId,
    pub is_exterior: bool,
    pub segments: Vec<Rc<Segment>>,
    pub bbox: Bbox,
}

#[derive(Debug)]
pub(crate) struct PolyIn {
    pub multi_poly: MultiPolyId,
    pub exterior_ring: RingId,
    pub interior_rings: Vec<RingId>,
    pub bbox: Bbox,
}

#[derive(Debug)]
pub(crate) struct MultiPolyIn {
    pub polys: Vec<PolyId>,
    pub bbox: Bbox,
    pub is_subject: bool,
}

/// Flat per-operation arenas for the input model. Rings, polygons and
/// multipolygons address each other by index, which stands in for the
/// pointer identity the rest of the algorithm needs (winding bookkeeping,
/// membership states).
#[derive(Debug, Default)]
pub(crate) struct InputGeometry {
    pub rings: Vec<RingIn>,
    pub polys: Vec<PolyIn>,
    pub multi_polys: Vec<MultiPolyIn>,
}

fn invalid(detail: &str) -> Error {
    Error::InvalidInput(format!(
        "Input geometry is not a valid polygon or multipolygon ({detail})."
    ))
}

impl InputGeometry {
    pub fn ring(&self, id: RingId) -> &RingIn {
        &self.rings[id.0]
    }

    pub fn poly(&self, id: PolyId) -> &PolyIn {
        &self.polys[id.0]
    }

    pub fn multi_poly(&self, id: MultiPolyId) -> &MultiPolyIn {
        &self.multi_polys[id.0]
    }

    /// Construct a multipolygon from raw nested coordinates. On failure the
    /// arenas are rolled back so a rejected clipper leaves no trace.
    pub fn add_multi_poly(
        &mut self,
        geom: &[Vec<Vec<Vec<f64>>>],
        is_subject: bool,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Result<MultiPolyId, Error> {
        let rings_mark = self.rings.len();
        let polys_mark = self.polys.len();
        let multi_polys_mark = self.multi_polys.len();
        let segments_mark = arena.len();

        match self.try_add_multi_poly(geom, is_subject, rounder, arena) {
            Ok(id) => Ok(id),
            Err(err) => {
                self.rings.truncate(rings_mark);
                self.polys.truncate(polys_mark);
                self.multi_polys.truncate(multi_polys_mark);
                arena.truncate(segments_mark);
                Err(err)
            }
        }
    }

    fn try_add_multi_poly(
        &mut self,
        geom: &[Vec<Vec<Vec<f64>>>],
        is_subject: bool,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Result<MultiPolyId, Error> {
        let mp_id = MultiPolyId(self.multi_polys.len());
        let mut polys = Vec::with_capacity(geom.len());
        let mut bbox = Bbox {
            ll: V2::new(f64::INFINITY, f64::INFINITY),
            ur: V2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        };

        for poly in geom {
            let poly_id = self.add_poly(poly, mp_id, rounder, arena)?;
            let pb = self.poly(poly_id).bbox;
            if pb.ll.x < bbox.ll.x {
                bbox.ll.x = pb.ll.x;
            }
            if pb.ll.y < bbox.ll.y {
                bbox.ll.y = pb.ll.y;
            }
            if pb.ur.x > bbox.ur.x {
                bbox.ur.x = pb.ur.x;
            }
            if pb.ur.y > bbox.ur.y {
                bbox.ur.y = pb.ur.y;
            }
            polys.push(poly_id);
        }

        self.multi_polys.push(MultiPolyIn {
            polys,
            bbox,
            is_subject,
        });
        Ok(mp_id)
    }

    fn add_poly(
        &mut self,
        poly: &[Vec<Vec<f64>>],
        multi_poly: MultiPolyId,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Result<PolyId, Error> {
        if poly.is_empty() {
            return Err(invalid("empty"));
        }

        let poly_id = PolyId(self.polys.len());
        let exterior_ring = self.add_ring(&poly[0], poly_id, true, rounder, arena)?;
        let mut bbox = self.ring(exterior_ring).bbox;

        let mut interior_rings = Vec::with_capacity(poly.len() - 1);
        for ring in &poly[1..] {
            let ring_id = self.add_ring(ring, poly_id, false, rounder, arena)?;
            let rb = self.ring(ring_id).bbox;
            if rb.ll.x < bbox.ll.x {
                bbox.ll.x = rb.ll.x;
            }
            if rb.ll.y < bbox.ll.y {
                bbox.ll.y = rb.ll.y;
            }
            if rb.ur.x > bbox.ur.x {
                bbox.ur.x = rb.ur.x;
            }
            if rb.ur.y > bbox.ur.y {
                bbox.ur.y = rb.ur.y;
            }
            interior_rings.push(ring_id);
        }

        self.polys.push(PolyIn {
            multi_poly,
            exterior_ring,
            interior_rings,
            bbox,
        });
        Ok(poly_id)
    }

    fn add_ring(
        &mut self,
        ring: &[Vec<f64>],
        poly: PolyId,
        is_exterior: bool,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Result<RingId, Error> {
        if ring.is_empty() {
            return Err(invalid("empty"));
        }
        if ring[0].len() < 2 {
            return Err(invalid("empty"));
        }

        let ring_id = RingId(self.rings.len());

        // extra ordinates beyond x and y are discarded
        let first_point = rounder.round(ring[0][0], ring[0][1]);
        let mut bbox = Bbox {
            ll: first_point.xy(),
            ur: first_point.xy(),
        };

        let mut segments = Vec::new();
        let mut prev_point = first_point.clone();
        for coords in &ring[1..] {
            if coords.len() < 2 {
                return Err(invalid("missing coordinates"));
            }
            let point = rounder.round(coords[0], coords[1]);

            // skip repeated points
            if Rc::ptr_eq(&point, &prev_point) {
                continue;
            }

            segments.push(Segment::new_from_ring(arena, &prev_point, &point, ring_id)?);

            if point.x < bbox.ll.x {
                bbox.ll.x = point.x;
            }
            if point.y < bbox.ll.y {
                bbox.ll.y = point.y;
            }
            if point.x > bbox.ur.x {
                bbox.ur.x = point.x;
            }
            if point.y > bbox.ur.y {
                bbox.ur.y = point.y;
            }
            prev_point = point;
        }

        // close the ring unless the input already did
        if !Rc::ptr_eq(&first_point, &prev_point) {
            segments.push(Segment::new_from_ring(
                arena,
                &prev_point,
                &first_point,
                ring_id,
            )?);
        }

        self.rings.push(RingIn {
            poly,
            is_exterior,
            segments,
            bbox,
        });
        Ok(ring_id)
    }

    /// Both endpoints of every segment of the multipolygon, ready for the
    /// event queue.
    pub fn sweep_events(&self, id: MultiPolyId) -> Vec<Rc<SweepEvent>> {
        let mut events = Vec::new();
        for &poly_id in &self.multi_poly(id).polys {
            let poly = self.poly(poly_id);
            for &ring_id in std::iter::once(&poly.exterior_ring).chain(&poly.interior_rings) {
                for segment in &self.ring(ring_id).segments {
                    events.push(segment.left_se());
                    events.push(segment.right_se());
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn simple_ring_construction() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let id = input
            .add_multi_poly(&[vec![square(0.0, 0.0, 1.0)]], true, &rounder, &arena)
            .unwrap();

        let mp = input.multi_poly(id);
        assert!(mp.is_subject);
        assert_eq!(mp.polys.len(), 1);

        let poly = input.poly(mp.polys[0]);
        assert!(poly.interior_rings.is_empty());

        let ring = input.ring(poly.exterior_ring);
        assert!(ring.is_exterior);
        assert_eq!(ring.segments.len(), 4);
        assert_eq!(ring.bbox.ll, V2::new(0.0, 0.0));
        assert_eq!(ring.bbox.ur, V2::new(1.0, 1.0));
    }

    #[test]
    fn unclosed_ring_is_closed() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let ring = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ];
        let id = input
            .add_multi_poly(&[vec![ring]], true, &rounder, &arena)
            .unwrap();
        let ring = input.ring(input.poly(input.multi_poly(id).polys[0]).exterior_ring);
        assert_eq!(ring.segments.len(), 4);
    }

    #[test]
    fn repeated_points_are_skipped() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let ring = vec![
            vec![0.0, 0.0],
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ];
        let id = input
            .add_multi_poly(&[vec![ring]], true, &rounder, &arena)
            .unwrap();
        let ring = input.ring(input.poly(input.multi_poly(id).polys[0]).exterior_ring);
        assert_eq!(ring.segments.len(), 3);
    }

    #[test]
    fn extra_ordinates_are_discarded() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let ring = vec![
            vec![0.0, 0.0, 7.0],
            vec![1.0, 0.0, 8.0],
            vec![1.0, 1.0, 9.0],
            vec![0.0, 0.0, 10.0],
        ];
        let id = input
            .add_multi_poly(&[vec![ring]], true, &rounder, &arena)
            .unwrap();
        let ring = input.ring(input.poly(input.multi_poly(id).polys[0]).exterior_ring);
        assert_eq!(ring.segments.len(), 3);
    }

    #[test]
    fn empty_ring_is_invalid() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let err = input
            .add_multi_poly(&[vec![vec![]]], true, &rounder, &arena)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn short_point_is_invalid() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let ring = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0]];
        let err = input
            .add_multi_poly(&[vec![ring]], true, &rounder, &arena)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn empty_polygon_is_invalid() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let err = input
            .add_multi_poly(&[vec![]], true, &rounder, &arena)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn empty_multipolygon_is_fine() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let id = input.add_multi_poly(&[], true, &rounder, &arena).unwrap();
        assert!(input.multi_poly(id).polys.is_empty());
        assert!(input.sweep_events(id).is_empty());
    }

    #[test]
    fn failed_input_rolls_back_arenas() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        input
            .add_multi_poly(&[vec![square(0.0, 0.0, 1.0)]], true, &rounder, &arena)
            .unwrap();
        let rings_before = input.rings.len();
        let segments_before = arena.len();

        // second polygon of the clipper is broken
        let bad = vec![vec![square(5.0, 5.0, 1.0)], vec![vec![]]];
        assert!(input
            .add_multi_poly(&bad, false, &rounder, &arena)
            .is_err());

        assert_eq!(input.rings.len(), rings_before);
        assert_eq!(input.multi_polys.len(), 1);
        assert_eq!(arena.len(), segments_before);
    }

    #[test]
    fn poly_with_hole_bboxes() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let poly = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        let id = input
            .add_multi_poly(&[poly], true, &rounder, &arena)
            .unwrap();
        let poly = input.poly(input.multi_poly(id).polys[0]);
        assert_eq!(poly.interior_rings.len(), 1);
        assert!(!input.ring(poly.interior_rings[0]).is_exterior);
        assert_eq!(poly.bbox.ll, V2::new(0.0, 0.0));
        assert_eq!(poly.bbox.ur, V2::new(10.0, 10.0));
        assert_eq!(input.ring(poly.interior_rings[0]).bbox.ur, V2::new(6.0, 6.0));
    }

    #[test]
    fn sweep_events_pair_per_segment() {
        let mut input = InputGeometry::default();
        let rounder = PtRounder::new();
        let arena = SegmentArena::new();
        let id = input
            .add_multi_poly(&[vec![square(0.0, 0.0, 1.0)]], true, &rounder, &arena)
            .unwrap();
        let events = input.sweep_events(id);
        assert_eq!(events.len(), 8);
        let lefts = events.iter().filter(|e| e.is_left.get()).count();
        assert_eq!(lefts, 4);
    }
}
