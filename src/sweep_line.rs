use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::rc::Rc;

use log::trace;

use crate::error::Error;
use crate::point::Point;
use crate::rounder::PtRounder;
use crate::segment::{segment_compare, Segment, SegmentArena};
use crate::sweep_event::{compare_points, sweep_event_compare, SweepEvent};

/// Queue key: a sweep event ordered by `sweep_event_compare`.
///
/// The order is total; two events compare `Equal` only when they are the
/// same event (the segment id is the final tie-breaker), so `BTreeSet`
/// never conflates distinct events.
#[derive(Clone, Debug)]
struct QueuedEvent(Rc<SweepEvent>);

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        sweep_event_compare(&self.0, &other.0)
    }
}

/// Status key: a segment ordered by its vertical position on the sweep
/// line via `segment_compare`.
#[derive(Clone, Debug)]
struct ActiveSegment(Rc<Segment>);

impl PartialEq for ActiveSegment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ActiveSegment {}

impl PartialOrd for ActiveSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ActiveSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        segment_compare(&self.0, &other.0)
    }
}

/// Drives the algorithm: the event priority queue and the status structure
/// of segments currently crossing the sweep line.
///
/// Both are `BTreeSet`s keyed by the respective total orders. A segment's
/// ordering keys (its endpoints) must stay stable while it sits in a tree,
/// so any mutation (splitting) pulls the segment out first and re-inserts
/// it afterwards.
pub(crate) struct SweepLine {
    queue: BTreeSet<QueuedEvent>,
    tree: BTreeSet<ActiveSegment>,
    /// Left events fully processed, in order; the feed for output assembly.
    pub segments: Vec<Rc<Segment>>,
}

impl SweepLine {
    pub fn new() -> Self {
        SweepLine {
            queue: BTreeSet::new(),
            tree: BTreeSet::new(),
            segments: Vec::new(),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_insert(&mut self, event: &Rc<SweepEvent>) {
        self.queue.insert(QueuedEvent(event.clone()));
    }

    pub fn pop_first(&mut self) -> Option<Rc<SweepEvent>> {
        self.queue.pop_first().map(|e| e.0)
    }

    /// Process one event. Returns the events the caller must (re)enqueue.
    pub fn process(
        &mut self,
        event: &Rc<SweepEvent>,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Result<Vec<Rc<SweepEvent>>, Error> {
        let seg = event.segment();
        let mut new_events: Vec<Rc<SweepEvent>> = Vec::new();

        // a consumed event just cleans up after its surviving twin
        if event.is_consumed() {
            if event.is_left.get() {
                self.queue.remove(&QueuedEvent(event.other()));
            } else {
                self.tree.remove(&ActiveSegment(seg.clone()));
            }
            return Ok(new_events);
        }

        if event.is_left.get() {
            self.tree.insert(ActiveSegment(seg.clone()));
        } else if self.tree.get(&ActiveSegment(seg.clone())).is_none() {
            let (lp, rp) = (seg.left_se().point.clone(), seg.right_se().point.clone());
            return Err(Error::Internal(format!(
                "Unable to find segment #{} [{}, {}] -> [{}, {}] in sweep line tree. \
                 Please submit a bug report.",
                seg.id, lp.x, lp.y, rp.x, rp.y
            )));
        }

        let prev_seg = self.prev_unconsumed(&seg);
        let next_seg = self.next_unconsumed(&seg);

        if event.is_left.get() {
            trace!("left event at [{}, {}], segment #{}", event.point.x, event.point.y, seg.id);

            // check for intersections against both neighbors
            let prev_splitter =
                self.splitter_from_intersections(&seg, prev_seg.as_ref(), &mut new_events, rounder, arena);
            let next_splitter =
                self.splitter_from_intersections(&seg, next_seg.as_ref(), &mut new_events, rounder, arena);

            let mut removed_from_tree = false;
            if prev_splitter.is_some() || next_splitter.is_some() {
                // even if both neighbors yielded an intersection, only split
                // on the earlier one; the other resurfaces in a later event
                let splitter = match (prev_splitter, next_splitter) {
                    (Some(p), None) => p,
                    (None, Some(n)) => n,
                    (Some(p), Some(n)) => {
                        if compare_points(&p, &n) != Ordering::Greater {
                            p
                        } else {
                            n
                        }
                    }
                    (None, None) => unreachable!(),
                };

                // pull the segment and its queued right event out before the
                // split mutates the ordering keys
                self.tree.remove(&ActiveSegment(seg.clone()));
                removed_from_tree = true;
                let right_se = seg.right_se();
                self.queue.remove(&QueuedEvent(right_se.clone()));
                new_events.push(right_se);
                new_events.extend(seg.split(&splitter, arena));
            }

            if !new_events.is_empty() {
                // something split; re-do this event so the sweep line
                // ordering is fully settled before prev pointers are taken
                if !removed_from_tree {
                    self.tree.remove(&ActiveSegment(seg.clone()));
                }
                new_events.push(event.clone());
            } else {
                // done with the left event
                self.segments.push(seg.clone());
                *seg.prev.borrow_mut() = prev_seg;
            }
        } else {
            trace!("right event at [{}, {}], segment #{}", event.point.x, event.point.y, seg.id);

            // we're leaving the sweep line; our former neighbors become
            // adjacent and may intersect
            if let (Some(prev), Some(next)) = (prev_seg.as_ref(), next_seg.as_ref()) {
                if let Some(inter) = prev.get_intersection(next, rounder) {
                    if !prev.is_an_endpoint(&inter) {
                        new_events.extend(self.split_safely(prev, &inter, arena));
                    }
                    if !next.is_an_endpoint(&inter) {
                        new_events.extend(self.split_safely(next, &inter, arena));
                    }
                }
            }
            self.tree.remove(&ActiveSegment(seg.clone()));
        }

        Ok(new_events)
    }

    fn prev_unconsumed(&self, seg: &Rc<Segment>) -> Option<Rc<Segment>> {
        self.tree
            .range((Bound::Unbounded, Bound::Excluded(ActiveSegment(seg.clone()))))
            .rev()
            .find(|s| s.0.consumed_by.borrow().is_none())
            .map(|s| s.0.clone())
    }

    fn next_unconsumed(&self, seg: &Rc<Segment>) -> Option<Rc<Segment>> {
        self.tree
            .range((Bound::Excluded(ActiveSegment(seg.clone())), Bound::Unbounded))
            .find(|s| s.0.consumed_by.borrow().is_none())
            .map(|s| s.0.clone())
    }

    /// Intersect `seg` with one of its neighbors. A point interior to the
    /// neighbor splits the neighbor right here (safely); a point interior
    /// to `seg` is returned for the caller to split `seg` with.
    fn splitter_from_intersections(
        &mut self,
        seg: &Rc<Segment>,
        other: Option<&Rc<Segment>>,
        new_events: &mut Vec<Rc<SweepEvent>>,
        rounder: &PtRounder,
        arena: &SegmentArena,
    ) -> Option<Rc<Point>> {
        let other = other?;
        let inter = other.get_intersection(seg, rounder)?;
        let mut splitter = None;
        if !seg.is_an_endpoint(&inter) {
            splitter = Some(inter.clone());
        }
        if !other.is_an_endpoint(&inter) {
            new_events.extend(self.split_safely(other, &inter, arena));
        }
        splitter
    }

    /// Split a segment that currently sits in the data structures, ie any
    /// segment other than the one whose event is being processed. The
    /// segment leaves the tree (and its right event the queue) for the
    /// duration of the split, since splitting shifts its ordering keys.
    fn split_safely(
        &mut self,
        seg: &Rc<Segment>,
        point: &Rc<Point>,
        arena: &SegmentArena,
    ) -> Vec<Rc<SweepEvent>> {
        self.tree.remove(&ActiveSegment(seg.clone()));
        let right_se = seg.right_se();
        self.queue.remove(&QueuedEvent(right_se.clone()));
        let mut new_events = seg.split(point, arena);
        new_events.push(right_se);
        // splitting can trigger consumption
        if seg.consumed_by.borrow().is_none() {
            self.tree.insert(ActiveSegment(seg.clone()));
        }
        new_events
    }
}
