use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use crate::flp::flp_cmp;
use crate::operation::OpCtx;
use crate::point::Point;
use crate::segment::{segment_compare, Segment};
use crate::vector::{cosine_of_angle, sine_of_angle};

/// One endpoint of a segment as it enters (left) or leaves (right) the
/// sweep line.
///
/// Events at the same rounded position share their canonical [`Point`] and
/// therefore each other's company via the point's event list. The segment
/// and counterpart links are weak: events are owned by their segment, and
/// segments by the per-operation arena.
#[derive(Debug)]
pub(crate) struct SweepEvent {
    pub point: Rc<Point>,
    pub is_left: Cell<bool>,
    pub segment: RefCell<Weak<Segment>>,
    pub other_se: RefCell<Weak<SweepEvent>>,
    pub consumed_by: RefCell<Option<Weak<SweepEvent>>>,
}

impl SweepEvent {
    pub fn new(point: Rc<Point>, is_left: bool) -> Rc<SweepEvent> {
        let se = Rc::new(SweepEvent {
            point,
            is_left: Cell::new(is_left),
            segment: RefCell::new(Weak::new()),
            other_se: RefCell::new(Weak::new()),
            consumed_by: RefCell::new(None),
        });
        se.point.events.borrow_mut().push(Rc::downgrade(&se));
        se
    }

    pub fn segment(&self) -> Rc<Segment> {
        self.segment
            .borrow()
            .upgrade()
            .expect("sweep event outlived its segment")
    }

    pub fn other(&self) -> Rc<SweepEvent> {
        self.other_se
            .borrow()
            .upgrade()
            .expect("sweep event outlived its counterpart")
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_by.borrow().is_some()
    }

    /// Compare every pair of events at this point and consume segments that
    /// span the same two points. The later segment (in sweep order) is
    /// folded into the earlier one.
    pub fn check_for_consuming(&self) {
        let events = self.point.live_events();
        for (i, evt1) in events.iter().enumerate() {
            if evt1.segment().consumed_by.borrow().is_some() {
                continue;
            }
            for evt2 in &events[i + 1..] {
                if evt2.segment().consumed_by.borrow().is_some() {
                    continue;
                }
                // same span iff the far endpoints coincide too
                if !Rc::ptr_eq(&evt1.other().point, &evt2.other().point) {
                    continue;
                }
                Segment::consume(&evt1.segment(), &evt2.segment());
            }
        }
    }

    /// Events at this point whose segment is in the result and not yet
    /// stitched into an output ring: the candidate continuations of a ring
    /// walk arriving here.
    pub fn get_available_linked_events(&self, ctx: &OpCtx) -> Vec<Rc<SweepEvent>> {
        let mut events = Vec::new();
        for evt in self.point.live_events() {
            if !evt.segment().is_in_result(ctx) {
                continue;
            }
            if !std::ptr::eq(self, Rc::as_ptr(&evt)) && evt.segment().ring_out().is_none() {
                events.push(evt);
            }
        }
        events
    }

    /// Direction of the continuation offered by `linked`, measured at this
    /// point relative to the direction back towards `base`.
    pub fn angles_via(&self, base: &SweepEvent, linked: &SweepEvent) -> Angles {
        let next = linked.other();
        Angles {
            sine: sine_of_angle(self.point.xy(), base.point.xy(), next.point.xy()),
            cosine: cosine_of_angle(self.point.xy(), base.point.xy(), next.point.xy()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Angles {
    pub sine: f64,
    pub cosine: f64,
}

/// Ranks continuation candidates so the left-most turn (relative to the
/// incoming direction) sorts first. Quadrant-aware: the sine signs pick the
/// half-plane, the cosines order within it.
pub(crate) fn leftmost_compare(a: &Angles, b: &Angles) -> Ordering {
    // both on or above the x-axis
    if a.sine >= 0.0 && b.sine >= 0.0 {
        if a.cosine < b.cosine {
            return Ordering::Greater;
        }
        if a.cosine > b.cosine {
            return Ordering::Less;
        }
        return Ordering::Equal;
    }

    // both below the x-axis
    if a.sine < 0.0 && b.sine < 0.0 {
        if a.cosine < b.cosine {
            return Ordering::Less;
        }
        if a.cosine > b.cosine {
            return Ordering::Greater;
        }
        return Ordering::Equal;
    }

    // one above, one below
    if b.sine < a.sine {
        return Ordering::Less;
    }
    if b.sine > a.sine {
        return Ordering::Greater;
    }
    Ordering::Equal
}

/// Point ordering for the event queue: by x, then y, flp-compared.
pub(crate) fn compare_points(a: &Point, b: &Point) -> Ordering {
    let cmp_x = flp_cmp(a.x, b.x);
    if cmp_x != Ordering::Equal {
        return cmp_x;
    }
    flp_cmp(a.y, b.y)
}

/// Total order on sweep events, driving the event queue.
pub(crate) fn sweep_event_compare(a: &SweepEvent, b: &SweepEvent) -> Ordering {
    let pt_cmp = compare_points(&a.point, &b.point);
    if pt_cmp != Ordering::Equal {
        return pt_cmp;
    }

    // same point: favor right events over left, so segments that end here
    // leave the sweep line before new ones enter
    if a.is_left.get() != b.is_left.get() {
        return if a.is_left.get() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }

    // two matching left or right endpoints order as their segments do
    segment_compare(&a.segment(), &b.segment())
}
