use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::sweep_event::SweepEvent;
use crate::vector::V2;

/// A position in the plane, canonicalized by the rounder: within one
/// operation there is exactly one `Point` per rounded `(x, y)`, so
/// coincident sweep events share their point by construction and identity
/// comparisons (`Rc::ptr_eq`) detect coincidence.
///
/// The event list collects every sweep event located here; entries are weak
/// so the point does not keep events (and through them, segments) alive.
#[derive(Debug)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
    pub events: RefCell<Vec<Weak<SweepEvent>>>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Rc<Point> {
        Rc::new(Point {
            x,
            y,
            events: RefCell::new(Vec::new()),
        })
    }

    pub fn xy(&self) -> V2 {
        V2::new(self.x, self.y)
    }

    /// Coordinate equality. Identity (same canonical point) implies this,
    /// not the other way around.
    pub fn coords_equal(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// The live sweep events at this point, in arrival order.
    pub fn live_events(&self) -> Vec<Rc<SweepEvent>> {
        self.events
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}
