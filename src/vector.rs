use std::cmp::Ordering;
use std::ops::Sub;

use crate::flp::flp_cmp;

/// A plain 2-vector. Doubles as a position when the context is a point in
/// the plane rather than a displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct V2 {
    pub x: f64,
    pub y: f64,
}

impl V2 {
    pub fn new(x: f64, y: f64) -> Self {
        V2 { x, y }
    }
}

impl Sub for V2 {
    type Output = V2;

    fn sub(self, rhs: V2) -> V2 {
        V2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

pub(crate) fn cross_product(v1: V2, v2: V2) -> f64 {
    v1.x * v2.y - v1.y * v2.x
}

pub(crate) fn dot_product(v1: V2, v2: V2) -> f64 {
    v1.x * v2.x + v1.y * v2.y
}

pub(crate) fn length(v: V2) -> f64 {
    dot_product(v, v).sqrt()
}

/// Orientation of `end_pt2` relative to the ray `base_pt -> end_pt1`,
/// as the flp-compared sign of the cross product.
pub(crate) fn compare_angles(base_pt: V2, end_pt1: V2, end_pt2: V2) -> Ordering {
    flp_cmp(cross_product(end_pt1 - base_pt, end_pt2 - base_pt), 0.0)
}

/// Sine of the angle at `p_shared` from the ray towards `p_base` to the ray
/// towards `p_angle`. Positive when `p_angle` is clockwise of `p_base`.
pub(crate) fn sine_of_angle(p_shared: V2, p_base: V2, p_angle: V2) -> f64 {
    let v_base = p_base - p_shared;
    let v_angle = p_angle - p_shared;
    cross_product(v_angle, v_base) / length(v_angle) / length(v_base)
}

/// Cosine of the angle at `p_shared` from the ray towards `p_base` to the
/// ray towards `p_angle`.
pub(crate) fn cosine_of_angle(p_shared: V2, p_base: V2, p_angle: V2) -> f64 {
    let v_base = p_base - p_shared;
    let v_angle = p_angle - p_shared;
    dot_product(v_angle, v_base) / length(v_angle) / length(v_base)
}

#[allow(dead_code)]
pub(crate) fn perpendicular(v: V2) -> V2 {
    V2::new(-v.y, v.x)
}

/// Where does the line given by direction `v` through `pt` cross the
/// horizontal line at `y`? `None` for a horizontal `v`.
pub(crate) fn horizontal_intersection(v: V2, pt: V2, y: f64) -> Option<V2> {
    if v.y == 0.0 {
        return None;
    }
    Some(V2::new(pt.x + v.x / v.y * (y - pt.y), y))
}

/// Where does the line given by direction `v` through `pt` cross the
/// vertical line at `x`? `None` for a vertical `v`.
pub(crate) fn vertical_intersection(v: V2, pt: V2, x: f64) -> Option<V2> {
    if v.x == 0.0 {
        return None;
    }
    Some(V2::new(x, pt.y + v.y / v.x * (x - pt.x)))
}

/// Intersection of the infinite lines through `pt1` with direction `v1` and
/// through `pt2` with direction `v2`. `None` iff the lines are parallel.
pub(crate) fn intersection(v1: V2, v2: V2, pt1: V2, pt2: V2) -> Option<V2> {
    // take some shortcuts for vertical and horizontal lines
    // this also ensures we don't calculate an intersection and then discover
    // it's actually outside the bounding box of the line
    if v1.x == 0.0 {
        return vertical_intersection(v2, pt2, pt1.x);
    }
    if v2.x == 0.0 {
        return vertical_intersection(v1, pt1, pt2.x);
    }
    if v1.y == 0.0 {
        return horizontal_intersection(v2, pt2, pt1.y);
    }
    if v2.y == 0.0 {
        return horizontal_intersection(v1, pt1, pt2.y);
    }

    // General case, following Schneider & Eberly pg 244.
    let kross = cross_product(v1, v2);
    if kross == 0.0 {
        return None;
    }

    let ve = pt2 - pt1;
    let d1 = cross_product(ve, v1) / kross;
    let d2 = cross_product(ve, v2) / kross;

    // average the two parameterizations to minimize rounding error
    let (x1, x2) = (pt1.x + d2 * v1.x, pt2.x + d1 * v2.x);
    let (y1, y2) = (pt1.y + d2 * v1.y, pt2.y + d1 * v2.y);
    Some(V2::new((x1 + x2) / 2.0, (y1 + y2) / 2.0))
}

/// Closest point on the line through `pt_a1` and `pt_a2` to `pt_b`.
#[allow(dead_code)]
pub(crate) fn closest_point(pt_a1: V2, pt_a2: V2, pt_b: V2) -> V2 {
    if pt_a1.x == pt_a2.x {
        return V2::new(pt_a1.x, pt_b.y); // vertical vector
    }
    if pt_a1.y == pt_a2.y {
        return V2::new(pt_b.x, pt_a1.y); // horizontal vector
    }

    // use the further endpoint as the base of the calculation, so that the
    // vectors are more parallel and the dot product more accurate
    let v1 = pt_b - pt_a1;
    let v2 = pt_b - pt_a2;
    let (v_far, v_a, far_pt) = if dot_product(v1, v1) > dot_product(v2, v2) {
        (v1, pt_a2 - pt_a1, pt_a1)
    } else {
        (v2, pt_a1 - pt_a2, pt_a2)
    };

    // if the X coordinate were on the line, would the Y coordinate be too?
    let x_dist = (pt_b.x - far_pt.x) / v_a.x;
    if pt_b.y == far_pt.y + x_dist * v_a.y {
        return pt_b;
    }

    // if the Y coordinate were on the line, would the X coordinate be too?
    let y_dist = (pt_b.y - far_pt.y) / v_a.y;
    if pt_b.x == far_pt.x + y_dist * v_a.x {
        return pt_b;
    }

    // not exactly on the line, project onto it
    let dist = dot_product(v_a, v_far) / dot_product(v_a, v_a);
    V2::new(far_pt.x + dist * v_a.x, far_pt.y + dist * v_a.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cross_and_dot() {
        let v1 = V2::new(1.0, 2.0);
        let v2 = V2::new(3.0, 4.0);
        assert_eq!(cross_product(v1, v2), -2.0);
        assert_eq!(dot_product(v1, v2), 11.0);
    }

    #[test]
    fn length_of_vector() {
        assert_eq!(length(V2::new(3.0, 4.0)), 5.0);
        assert_eq!(length(V2::new(0.0, -2.0)), 2.0);
    }

    #[test]
    fn compare_angles_orientation() {
        let base = V2::new(0.0, 0.0);
        let e1 = V2::new(1.0, 0.0);
        assert_eq!(compare_angles(base, e1, V2::new(1.0, 1.0)), Ordering::Greater);
        assert_eq!(compare_angles(base, e1, V2::new(2.0, 0.0)), Ordering::Equal);
        assert_eq!(compare_angles(base, e1, V2::new(1.0, -1.0)), Ordering::Less);
    }

    #[test]
    fn sine_cosine_of_angle_quadrants() {
        let shared = V2::new(0.0, 0.0);
        let base = V2::new(1.0, 0.0);

        assert_eq!(sine_of_angle(shared, base, V2::new(1.0, 0.0)), 0.0);
        assert_eq!(cosine_of_angle(shared, base, V2::new(1.0, 0.0)), 1.0);

        // 45 degrees clockwise of base
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        let angle = V2::new(1.0, -1.0);
        assert_relative_eq!(sine_of_angle(shared, base, angle), sqrt2_inv);
        assert_relative_eq!(cosine_of_angle(shared, base, angle), sqrt2_inv);

        // straight up
        assert_eq!(sine_of_angle(shared, base, V2::new(0.0, 1.0)), -1.0);
        assert_eq!(cosine_of_angle(shared, base, V2::new(0.0, 1.0)), 0.0);

        // opposite direction
        assert_eq!(sine_of_angle(shared, base, V2::new(-1.0, 0.0)), 0.0);
        assert_eq!(cosine_of_angle(shared, base, V2::new(-1.0, 0.0)), -1.0);
    }

    #[test]
    fn perpendicular_rotates_ccw() {
        assert_eq!(perpendicular(V2::new(1.0, 0.0)), V2::new(0.0, 1.0));
        assert_eq!(perpendicular(V2::new(0.0, 1.0)), V2::new(-1.0, 0.0));
    }

    #[test]
    fn intersection_general() {
        let p = intersection(
            V2::new(1.0, 1.0),
            V2::new(1.0, -1.0),
            V2::new(0.0, 0.0),
            V2::new(2.0, 2.0),
        )
        .unwrap();
        assert_eq!(p, V2::new(2.0, 2.0));

        let p = intersection(
            V2::new(1.0, 1.0),
            V2::new(1.0, -1.0),
            V2::new(0.0, 0.0),
            V2::new(0.0, 2.0),
        )
        .unwrap();
        assert_eq!(p, V2::new(1.0, 1.0));
    }

    #[test]
    fn intersection_parallel_is_none() {
        assert_eq!(
            intersection(
                V2::new(1.0, 1.0),
                V2::new(2.0, 2.0),
                V2::new(0.0, 0.0),
                V2::new(1.0, 0.0),
            ),
            None
        );
        // horizontal with horizontal
        assert_eq!(
            intersection(
                V2::new(1.0, 0.0),
                V2::new(1.0, 0.0),
                V2::new(0.0, 0.0),
                V2::new(0.0, 1.0),
            ),
            None
        );
        // vertical with vertical
        assert_eq!(
            intersection(
                V2::new(0.0, 1.0),
                V2::new(0.0, 1.0),
                V2::new(0.0, 0.0),
                V2::new(1.0, 0.0),
            ),
            None
        );
    }

    #[test]
    fn intersection_takes_axis_aligned_shortcuts() {
        // vertical first vector
        let p = intersection(
            V2::new(0.0, 2.0),
            V2::new(1.0, 1.0),
            V2::new(3.0, 0.0),
            V2::new(0.0, 0.0),
        )
        .unwrap();
        assert_eq!(p, V2::new(3.0, 3.0));

        // horizontal second vector
        let p = intersection(
            V2::new(1.0, 1.0),
            V2::new(5.0, 0.0),
            V2::new(0.0, 0.0),
            V2::new(0.0, 2.0),
        )
        .unwrap();
        assert_eq!(p, V2::new(2.0, 2.0));
    }

    #[test]
    fn closest_point_on_line() {
        // vertical
        assert_eq!(
            closest_point(V2::new(2.0, 0.0), V2::new(2.0, 5.0), V2::new(0.0, 3.0)),
            V2::new(2.0, 3.0)
        );
        // horizontal
        assert_eq!(
            closest_point(V2::new(0.0, 2.0), V2::new(5.0, 2.0), V2::new(3.0, 0.0)),
            V2::new(3.0, 2.0)
        );
        // point already on the line
        assert_eq!(
            closest_point(V2::new(0.0, 0.0), V2::new(4.0, 4.0), V2::new(2.0, 2.0)),
            V2::new(2.0, 2.0)
        );
        // general projection
        let p = closest_point(V2::new(0.0, 0.0), V2::new(4.0, 4.0), V2::new(0.0, 2.0));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 1.0);
    }
}
