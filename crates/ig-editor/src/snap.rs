//! Edge snapping for drag gestures.
//!
//! A moving rectangle snaps per axis to the nearest sibling edge or center
//! line within `threshold`. Axes are independent, so a box can align its
//! left edge with one sibling and its top with another.

use kurbo::{Rect, Vec2};

/// Guide lines a rectangle can align on, per axis: start, center, end.
fn lines(min: f64, max: f64) -> [f64; 3] {
    [min, (min + max) / 2.0, max]
}

fn snap_axis(moving: [f64; 3], targets: impl Iterator<Item = [f64; 3]>, threshold: f64) -> f64 {
    let mut best: Option<f64> = None;
    for target in targets {
        for t in target {
            for m in moving {
                let delta = t - m;
                if delta.abs() <= threshold && best.is_none_or(|b| delta.abs() < b.abs()) {
                    best = Some(delta);
                }
            }
        }
    }
    best.unwrap_or(0.0)
}

/// Correction to add to `moving`'s origin so it lines up with `siblings`.
/// Zero on an axis with no line within `threshold`.
pub fn snap_offset(moving: Rect, siblings: &[Rect], threshold: f64) -> Vec2 {
    if threshold <= 0.0 {
        return Vec2::ZERO;
    }
    let dx = snap_axis(
        lines(moving.x0, moving.x1),
        siblings.iter().map(|r| lines(r.x0, r.x1)),
        threshold,
    );
    let dy = snap_axis(
        lines(moving.y0, moving.y1),
        siblings.iter().map(|r| lines(r.y0, r.y1)),
        threshold,
    );
    Vec2::new(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_left_edge_within_threshold() {
        let moving = Rect::new(103.0, 500.0, 153.0, 520.0);
        let sibling = Rect::new(100.0, 0.0, 200.0, 40.0);
        assert_eq!(snap_offset(moving, &[sibling], 6.0), Vec2::new(-3.0, 0.0));
    }

    #[test]
    fn picks_nearest_line_per_axis() {
        let moving = Rect::new(0.0, 0.0, 10.0, 10.0);
        let a = Rect::new(12.0, 200.0, 30.0, 220.0); // left edge 2 away from our right
        let b = Rect::new(200.0, 9.0, 230.0, 30.0); // top 1 away from our bottom
        assert_eq!(snap_offset(moving, &[a, b], 6.0), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn no_snap_outside_threshold() {
        let moving = Rect::new(0.0, 0.0, 10.0, 10.0);
        let far = Rect::new(50.0, 50.0, 60.0, 60.0);
        assert_eq!(snap_offset(moving, &[far], 6.0), Vec2::ZERO);
        assert_eq!(snap_offset(moving, &[far], 0.0), Vec2::ZERO);
    }
}
