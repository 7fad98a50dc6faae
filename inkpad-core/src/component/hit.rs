//! Exact intersection tests between canvas-space shapes and axis-aligned rectangles.
//! All tests are closed: touching counts as intersecting.

use crate::util::Rect;

/// Does the segment `a..b` touch the rectangle? Liang-Barsky clipping.
pub(crate) fn segment_intersects_rect(a: [f32; 2], b: [f32; 2], rect: &Rect) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-dx, a[0] - rect.x),
        (dx, rect.right() - a[0]),
        (-dy, a[1] - rect.y),
        (dy, rect.bottom() - a[1]),
    ] {
        if p == 0.0 {
            // Parallel to this edge, and outside of it.
            if q < 0.0 {
                return false;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
    }
    t0 <= t1
}

/// Nonzero winding number of the implicitly closed polygon around `p`.
pub(crate) fn winding_number(polygon: &[[f32; 2]], p: [f32; 2]) -> i32 {
    let side = |a: [f32; 2], b: [f32; 2]| (b[0] - a[0]) * (p[1] - a[1]) - (p[0] - a[0]) * (b[1] - a[1]);
    let mut winding = 0;
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        if a[1] <= p[1] {
            if b[1] > p[1] && side(a, b) > 0.0 {
                winding += 1;
            }
        } else if b[1] <= p[1] && side(a, b) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Does the filled, implicitly closed polygon touch the rectangle?
pub(crate) fn polygon_intersects_rect(polygon: &[[f32; 2]], rect: &Rect) -> bool {
    match polygon {
        [] => false,
        [p] => rect.contains_point(*p),
        _ => {
            let edges_hit = polygon
                .iter()
                .zip(polygon.iter().cycle().skip(1))
                .any(|(&a, &b)| segment_intersects_rect(a, b, rect));
            // Otherwise, either the rect is wholly inside or wholly outside.
            edges_hit || winding_number(polygon, rect.center()) != 0
        }
    }
}

/// Does the open polyline touch the rectangle?
pub(crate) fn polyline_intersects_rect(points: &[[f32; 2]], rect: &Rect) -> bool {
    match points {
        [] => false,
        [p] => rect.contains_point(*p),
        _ => points
            .windows(2)
            .any(|pair| segment_intersects_rect(pair[0], pair[1], rect)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn segment_cases() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Crossing diagonally
        assert!(segment_intersects_rect([-5.0, 5.0], [5.0, 15.0], &r));
        // Wholly inside
        assert!(segment_intersects_rect([1.0, 1.0], [2.0, 2.0], &r));
        // Passing by the corner
        assert!(!segment_intersects_rect([11.0, 0.0], [20.0, 9.0], &r));
        // Touching an edge
        assert!(segment_intersects_rect([10.0, -5.0], [10.0, 20.0], &r));
    }
    #[test]
    fn polygon_containing_rect() {
        let big = [[-100.0, -100.0], [100.0, -100.0], [100.0, 100.0], [-100.0, 100.0]];
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(polygon_intersects_rect(&big, &r));
        let far = Rect::new(500.0, 0.0, 1.0, 1.0);
        assert!(!polygon_intersects_rect(&big, &far));
        // Winding direction doesn't matter
        let mut reversed = big;
        reversed.reverse();
        assert!(polygon_intersects_rect(&reversed, &r));
    }
}
