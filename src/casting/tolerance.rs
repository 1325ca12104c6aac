//! Geometric pass/fail predicates used by the matcher.
//!
//! A tolerance axis of exactly zero means "don't care": that axis is never
//! checked.  None of these functions allocate or fail; every call returns a
//! definite answer.

use super::math::{Rotator, RotationWrap, Vec3};

/// `actual` within `tolerance` of `reference`, or `tolerance` is zero.
pub fn within(actual: f32, reference: f32, tolerance: f32) -> bool {
    tolerance == 0.0 || (actual - reference).abs() <= tolerance
}

fn within_bounds(value: f32, a: f32, b: f32, tolerance: f32) -> bool {
    value >= a.min(b) - tolerance && value <= a.max(b) + tolerance
}

// ── Point tests ────────────────────────────────────────────

pub fn position_in_tolerance(actual: Vec3, reference: Vec3, tolerance: Vec3) -> bool {
    within(actual.x, reference.x, tolerance.x)
        && within(actual.y, reference.y, tolerance.y)
        && within(actual.z, reference.z, tolerance.z)
}

/// Per-axis angular deviation, folded by `wrap`, inside `tolerance`.
pub fn rotation_in_tolerance(
    actual: Rotator,
    reference: Rotator,
    tolerance: Rotator,
    wrap: RotationWrap,
) -> bool {
    let delta = (actual - reference).wrapped(wrap);
    within(delta.pitch, 0.0, tolerance.pitch)
        && within(delta.yaw, 0.0, tolerance.yaw)
        && within(delta.roll, 0.0, tolerance.roll)
}

// ── Path tests ─────────────────────────────────────────────

/// `current` lies on the sweep from `start` to `end`, widened by
/// `tolerance` at both ends.  A collapsed sweep becomes a band around
/// `start`.
pub fn rotation_path_in_tolerance(
    current: Rotator,
    start: Rotator,
    end: Rotator,
    tolerance: Rotator,
) -> bool {
    let cur = current.to_array();
    let s = start.to_array();
    let e = end.to_array();
    let tol = tolerance.to_array();
    (0..3).all(|a| tol[a] == 0.0 || within_bounds(cur[a], s[a], e[a], tol[a]))
}

/// `current` is on the straight segment `start -> end` within `tolerance`.
///
/// All three arguments share one origin (the hand's position at cast
/// start).  Axes that do not move are held to a band around `start`.  A
/// single moving axis is bound to the segment's extent; two moving axes
/// must also follow the segment's direction, see [`diagonal_in_tolerance`].
pub fn line_path_in_tolerance(current: Vec3, start: Vec3, end: Vec3, tolerance: Vec3) -> bool {
    let cur = current.to_array();
    let s = start.to_array();
    let e = end.to_array();
    let tol = tolerance.to_array();

    let mut moving = [0usize; 3];
    let mut count = 0;
    for a in 0..3 {
        if tol[a] == 0.0 {
            continue;
        }
        if e[a] == s[a] {
            if (cur[a] - s[a]).abs() > tol[a] {
                return false;
            }
        } else {
            moving[count] = a;
            count += 1;
        }
    }

    let bounded = moving[..count]
        .iter()
        .all(|&a| within_bounds(cur[a], s[a], e[a], tol[a]));
    if !bounded {
        return false;
    }

    if count == 2 {
        let (i, j) = (moving[0], moving[1]);
        return diagonal_in_tolerance(
            cur[i] - s[i],
            cur[j] - s[j],
            e[i] - s[i],
            e[j] - s[j],
            tol[i],
        );
    }
    true
}

/// Two-axis displacement `(rel_i, rel_j)` lies within `width` of the ideal
/// line pointing along `(delta_i, delta_j)`.
///
/// The observed length is projected onto the ideal angle; both resulting
/// coordinates are compared against the observation.
pub fn diagonal_in_tolerance(rel_i: f32, rel_j: f32, delta_i: f32, delta_j: f32, width: f32) -> bool {
    let length = rel_i.hypot(rel_j);
    let angle = delta_j.abs().atan2(delta_i.abs());
    let ideal_i = (length * angle.cos()).copysign(delta_i);
    let ideal_j = (length * angle.sin()).copysign(delta_j);
    (rel_i - ideal_i).abs() <= width && (rel_j - ideal_j).abs() <= width
}

/// Right-minus-left start offset agrees with the required `direction`.
///
/// Axes with no required direction must sit within `tolerance` of zero;
/// axes with a direction may extend arbitrarily that way but not against
/// it by more than `tolerance`.
pub fn relative_direction_in_tolerance(offset: Vec3, direction: Vec3, tolerance: f32) -> bool {
    let off = offset.to_array();
    let dir = direction.to_array();
    (0..3).all(|a| {
        if dir[a] == 0.0 {
            off[a].abs() <= tolerance
        } else {
            off[a] * dir[a].signum() >= -tolerance
        }
    })
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_zero_axis_is_ignored() {
        let tol = Vec3::new(0.0, 1.0, 1.0);
        let reference = Vec3::new(0.0, 2.0, 3.0);
        for x in [-1000.0, -1.0, 0.0, 5.0, 1e6] {
            assert!(position_in_tolerance(Vec3::new(x, 2.5, 3.0), reference, tol));
            assert!(!position_in_tolerance(Vec3::new(x, 4.0, 3.0), reference, tol));
        }
    }

    #[test]
    fn test_point_boundary_inclusive() {
        let tol = Vec3::new(1.0, 1.0, 1.0);
        assert!(position_in_tolerance(Vec3::new(1.0, -1.0, 0.0), Vec3::ZERO, tol));
        assert!(!position_in_tolerance(Vec3::new(1.01, 0.0, 0.0), Vec3::ZERO, tol));
    }

    #[test]
    fn test_rotation_point_wraps_difference() {
        let tol = Rotator::new(0.0, 30.0, 0.0);
        let a = Rotator::new(0.0, 170.0, 0.0);
        let b = Rotator::new(0.0, -170.0, 0.0);
        assert!(rotation_in_tolerance(a, b, tol, RotationWrap::Strict));
        assert!(rotation_in_tolerance(a, b, tol, RotationWrap::Legacy));
        assert!(!rotation_in_tolerance(a, Rotator::new(0.0, 100.0, 0.0), tol, RotationWrap::Strict));
    }

    #[test]
    fn test_rotation_point_ignores_zero_axes() {
        let tol = Rotator::new(0.0, 45.0, 30.0);
        let reference = Rotator::ZERO;
        assert!(rotation_in_tolerance(Rotator::new(89.0, 10.0, -20.0), reference, tol, RotationWrap::Strict));
        assert!(!rotation_in_tolerance(Rotator::new(0.0, 0.0, 31.0), reference, tol, RotationWrap::Strict));
    }

    #[test]
    fn test_rotation_path_sweep() {
        let tol = Rotator::new(0.0, 0.0, 30.0);
        let start = Rotator::new(0.0, 0.0, 90.0);
        let end = Rotator::new(0.0, 0.0, -90.0);
        assert!(rotation_path_in_tolerance(Rotator::new(0.0, 0.0, 0.0), start, end, tol));
        assert!(rotation_path_in_tolerance(Rotator::new(0.0, 0.0, 115.0), start, end, tol));
        assert!(!rotation_path_in_tolerance(Rotator::new(0.0, 0.0, -125.0), start, end, tol));
    }

    #[test]
    fn test_rotation_path_collapsed() {
        let tol = Rotator::new(45.0, 0.0, 30.0);
        let r = Rotator::new(10.0, 0.0, 0.0);
        assert!(rotation_path_in_tolerance(Rotator::new(50.0, 120.0, -25.0), r, r, tol));
        assert!(!rotation_path_in_tolerance(Rotator::new(60.0, 0.0, 0.0), r, r, tol));
    }

    #[test]
    fn test_line_single_axis() {
        let tol = Vec3::new(8.0, 8.0, 8.0);
        let end = Vec3::new(0.0, 0.0, 8.0);
        assert!(line_path_in_tolerance(Vec3::new(3.0, -2.0, 4.0), Vec3::ZERO, end, tol));
        assert!(line_path_in_tolerance(Vec3::new(0.0, 0.0, 15.0), Vec3::ZERO, end, tol));
        assert!(!line_path_in_tolerance(Vec3::new(0.0, 0.0, 17.0), Vec3::ZERO, end, tol));
        assert!(!line_path_in_tolerance(Vec3::new(9.0, 0.0, 4.0), Vec3::ZERO, end, tol));
    }

    #[test]
    fn test_line_diagonal() {
        let tol = Vec3::new(8.0, 8.0, 8.0);
        let end = Vec3::new(0.0, 16.0, -16.0);
        assert!(line_path_in_tolerance(Vec3::new(0.0, 6.0, -6.0), Vec3::ZERO, end, tol));
        assert!(line_path_in_tolerance(Vec3::new(0.0, 10.0, -6.0), Vec3::ZERO, end, tol));
        // Straight along Y only drifts off the diagonal as it grows.
        assert!(!line_path_in_tolerance(Vec3::new(0.0, 20.0, 0.0), Vec3::ZERO, end, tol));
        // Wrong direction along Z.
        assert!(!line_path_in_tolerance(Vec3::new(0.0, 4.0, 10.0), Vec3::ZERO, end, tol));
    }

    #[test]
    fn test_line_offset_start() {
        let tol = Vec3::new(1.0, 1.0, 1.0);
        let start = Vec3::new(0.0, 4.0, 0.0);
        let end = Vec3::new(0.0, 8.0, 0.0);
        assert!(line_path_in_tolerance(Vec3::new(0.5, 6.0, -0.5), start, end, tol));
        assert!(!line_path_in_tolerance(Vec3::new(0.0, 2.0, 0.0), start, end, tol));
    }

    #[test]
    fn test_line_zero_axis_is_ignored() {
        let tol = Vec3::new(0.0, 8.0, 8.0);
        let end = Vec3::new(-8.0, -8.0, 6.0);
        for x in [-100.0, 0.0, 42.0] {
            assert!(line_path_in_tolerance(Vec3::new(x, -4.0, 3.0), Vec3::ZERO, end, tol));
        }
    }

    #[test]
    fn test_diagonal() {
        assert!(diagonal_in_tolerance(3.0, 3.0, 1.0, 1.0, 0.5));
        assert!(diagonal_in_tolerance(-3.0, 3.0, -1.0, 1.0, 0.5));
        assert!(!diagonal_in_tolerance(3.0, 3.0, -1.0, 1.0, 0.5));
        assert!(!diagonal_in_tolerance(4.0, 0.0, 1.0, 1.0, 0.5));
        assert!(diagonal_in_tolerance(0.0, 0.0, 1.0, 2.0, 0.1));
    }

    #[test]
    fn test_relative_direction() {
        let across = Vec3::new(0.0, 1.0, 0.0);
        assert!(relative_direction_in_tolerance(Vec3::new(2.0, 30.0, -3.0), across, 8.0));
        assert!(relative_direction_in_tolerance(Vec3::new(0.0, -5.0, 0.0), across, 8.0));
        assert!(!relative_direction_in_tolerance(Vec3::new(0.0, -20.0, 0.0), across, 8.0));
        assert!(!relative_direction_in_tolerance(Vec3::new(9.0, 30.0, 0.0), across, 8.0));
    }
}
