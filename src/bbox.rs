use crate::vector::V2;

/// Axis-aligned bounding box, lower-left to upper-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bbox {
    pub ll: V2,
    pub ur: V2,
}

impl Bbox {
    pub fn is_in_bbox(&self, point: V2) -> bool {
        self.ll.x <= point.x
            && point.x <= self.ur.x
            && self.ll.y <= point.y
            && point.y <= self.ur.y
    }

    /// The overlap of two boxes, or `None` when they are disjoint. Boxes
    /// that merely touch overlap in a degenerate (zero-width) box.
    pub fn get_bbox_overlap(&self, other: Bbox) -> Option<Bbox> {
        // check if the bboxes overlap at all
        if other.ur.x < self.ll.x
            || self.ur.x < other.ll.x
            || other.ur.y < self.ll.y
            || self.ur.y < other.ll.y
        {
            return None;
        }

        // the overlap is the middle two X values and the middle two Y values
        let lower_x = if self.ll.x < other.ll.x { other.ll.x } else { self.ll.x };
        let upper_x = if self.ur.x < other.ur.x { self.ur.x } else { other.ur.x };
        let lower_y = if self.ll.y < other.ll.y { other.ll.y } else { self.ll.y };
        let upper_y = if self.ur.y < other.ur.y { self.ur.y } else { other.ur.y };

        Some(Bbox {
            ll: V2::new(lower_x, lower_y),
            ur: V2::new(upper_x, upper_y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(llx: f64, lly: f64, urx: f64, ury: f64) -> Bbox {
        Bbox {
            ll: V2::new(llx, lly),
            ur: V2::new(urx, ury),
        }
    }

    #[test]
    fn is_in_bbox_interior_and_boundary() {
        let b = bbox(0.0, 0.0, 2.0, 2.0);
        assert!(b.is_in_bbox(V2::new(1.0, 1.0)));
        assert!(b.is_in_bbox(V2::new(0.0, 0.0)));
        assert!(b.is_in_bbox(V2::new(2.0, 2.0)));
        assert!(b.is_in_bbox(V2::new(0.0, 2.0)));
        assert!(!b.is_in_bbox(V2::new(-1.0, 1.0)));
        assert!(!b.is_in_bbox(V2::new(1.0, 3.0)));
        assert!(!b.is_in_bbox(V2::new(2.1, 1.0)));
    }

    #[test]
    fn overlap_disjoint() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        assert_eq!(a.get_bbox_overlap(bbox(2.0, 2.0, 3.0, 3.0)), None);
        assert_eq!(a.get_bbox_overlap(bbox(2.0, 0.0, 3.0, 1.0)), None);
        assert_eq!(a.get_bbox_overlap(bbox(0.0, 2.0, 1.0, 3.0)), None);
        assert_eq!(a.get_bbox_overlap(bbox(-2.0, -2.0, -1.0, -1.0)), None);
    }

    #[test]
    fn overlap_proper() {
        let a = bbox(0.0, 0.0, 2.0, 2.0);
        let b = bbox(1.0, 1.0, 3.0, 3.0);
        assert_eq!(a.get_bbox_overlap(b), Some(bbox(1.0, 1.0, 2.0, 2.0)));
        assert_eq!(b.get_bbox_overlap(a), Some(bbox(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn overlap_containment() {
        let a = bbox(0.0, 0.0, 4.0, 4.0);
        let b = bbox(1.0, 1.0, 2.0, 2.0);
        assert_eq!(a.get_bbox_overlap(b), Some(b));
        assert_eq!(b.get_bbox_overlap(a), Some(b));
    }

    #[test]
    fn overlap_touching_is_degenerate() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        // shared edge
        let b = bbox(1.0, 0.0, 2.0, 1.0);
        assert_eq!(a.get_bbox_overlap(b), Some(bbox(1.0, 0.0, 1.0, 1.0)));
        // shared corner
        let c = bbox(1.0, 1.0, 2.0, 2.0);
        assert_eq!(a.get_bbox_overlap(c), Some(bbox(1.0, 1.0, 1.0, 1.0)));
    }
}
