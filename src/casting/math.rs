//! Vector and rotation primitives for grid-space gesture math.
//!
//! Axes follow the tracking runtime: X forward, Y right, Z up.
//! Rotations are pitch/yaw/roll in degrees.  Only yaw is ever applied to
//! positions (the casting grid never pitches or rolls).

use std::ops::{Add, Mul, Sub};

// ── Vec3 ───────────────────────────────────────────────────

/// A 3D point or displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from `[x, y, z]`.
    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Components as `[x, y, z]`, for per-axis loops.
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean length.
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Largest absolute component.
    pub fn abs_max(&self) -> f32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Component-wise minimum.
    pub fn component_min(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn component_max(&self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Number of non-zero components.
    pub fn nonzero_axes(&self) -> usize {
        self.to_array().iter().filter(|c| **c != 0.0).count()
    }

    /// Rotate around the up (Z) axis by `degrees`.
    pub fn rotate_yaw(&self, degrees: f32) -> Vec3 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vec3::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
            self.z,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ── Rotator ────────────────────────────────────────────────

/// Pitch/yaw/roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// Components as `[pitch, yaw, roll]`.
    pub fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }

    /// Wrap every axis according to `policy`.
    pub fn wrapped(&self, policy: RotationWrap) -> Rotator {
        Rotator::new(
            policy.wrap(self.pitch),
            policy.wrap(self.yaw),
            policy.wrap(self.roll),
        )
    }
}

impl Add for Rotator {
    type Output = Rotator;
    fn add(self, rhs: Rotator) -> Rotator {
        Rotator::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw, self.roll + rhs.roll)
    }
}

impl Sub for Rotator {
    type Output = Rotator;
    fn sub(self, rhs: Rotator) -> Rotator {
        Rotator::new(self.pitch - rhs.pitch, self.yaw - rhs.yaw, self.roll - rhs.roll)
    }
}

// ── Wraparound ─────────────────────────────────────────────

/// How relative angles are folded back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationWrap {
    /// Fold into (-180, 180].
    #[default]
    Strict,
    /// Single +/-360 correction outside a +/-260 band.
    Legacy,
}

impl RotationWrap {
    pub fn wrap(&self, degrees: f32) -> f32 {
        match self {
            Self::Strict => {
                let folded = (degrees + 180.0).rem_euclid(360.0) - 180.0;
                if folded <= -180.0 {
                    folded + 360.0
                } else {
                    folded
                }
            }
            Self::Legacy => {
                if degrees < -260.0 {
                    degrees + 360.0
                } else if degrees > 260.0 {
                    degrees - 360.0
                } else {
                    degrees
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Legacy => "legacy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Fraction of the `start -> end` distance covered by `current`.
///
/// Returns -1.0 when `start == end`; callers treat any negative value as
/// "no meaningful progress".
pub fn distance_factor(start: Vec3, end: Vec3, current: Vec3) -> f32 {
    let total = (end - start).length();
    if total == 0.0 {
        return -1.0;
    }
    (current - start).length() / total
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_yaw_quarter_turn() {
        let v = Vec3::new(1.0, 0.0, 2.0).rotate_yaw(90.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
        assert_eq!(v.z, 2.0);
    }

    #[test]
    fn test_abs_max() {
        assert_eq!(Vec3::new(1.0, -7.5, 3.0).abs_max(), 7.5);
        assert_eq!(Vec3::ZERO.abs_max(), 0.0);
    }

    #[test]
    fn test_nonzero_axes() {
        assert_eq!(Vec3::ZERO.nonzero_axes(), 0);
        assert_eq!(Vec3::new(0.0, 1.0, -1.0).nonzero_axes(), 2);
        assert_eq!(Vec3::new(1.0, 1.0, 1.0).nonzero_axes(), 3);
    }

    #[test]
    fn test_component_bounds() {
        let a = Vec3::new(1.0, 5.0, -2.0);
        let b = Vec3::new(3.0, -1.0, 0.0);
        assert_eq!(a.component_min(b), Vec3::new(1.0, -1.0, -2.0));
        assert_eq!(a.component_max(b), Vec3::new(3.0, 5.0, 0.0));
    }

    #[test]
    fn test_strict_wrap() {
        let w = RotationWrap::Strict;
        assert_eq!(w.wrap(0.0), 0.0);
        assert_eq!(w.wrap(180.0), 180.0);
        assert_eq!(w.wrap(-180.0), 180.0);
        assert!((w.wrap(270.0) - -90.0).abs() < 1e-4);
        assert!((w.wrap(-190.0) - 170.0).abs() < 1e-4);
        assert!((w.wrap(725.0) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_legacy_wrap_band() {
        let w = RotationWrap::Legacy;
        assert_eq!(w.wrap(200.0), 200.0);
        assert_eq!(w.wrap(-250.0), -250.0);
        assert_eq!(w.wrap(270.0), -90.0);
        assert_eq!(w.wrap(-300.0), 60.0);
    }

    #[test]
    fn test_rotator_wrapped() {
        let r = Rotator::new(190.0, -270.0, 45.0).wrapped(RotationWrap::Strict);
        assert!((r.pitch - -170.0).abs() < 1e-4);
        assert!((r.yaw - 90.0).abs() < 1e-4);
        assert_eq!(r.roll, 45.0);
    }

    #[test]
    fn test_distance_factor() {
        let f = distance_factor(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 5.0, 0.0));
        assert!((f - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_distance_factor_zero_length_sentinel() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(distance_factor(p, p, Vec3::ZERO), -1.0);
    }

    #[test]
    fn test_wrap_as_str_roundtrip() {
        for w in [RotationWrap::Strict, RotationWrap::Legacy] {
            assert_eq!(RotationWrap::from_str(w.as_str()), Some(w));
        }
    }
}
