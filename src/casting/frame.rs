//! The casting grid: a yaw-only reference frame captured at cast start.
//!
//! All keypoint positions and tolerances are expressed in grid space.  The
//! grid never pitches or rolls, so only yaw is removed from hand rotations.

use super::hands::{HandMode, HandPose, TrackingFrame};
use super::math::{Rotator, RotationWrap, Vec3};

/// Origin plus yaw, with the wrap policy for relative rotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateFrame {
    origin: Vec3,
    yaw: f32,
    wrap: RotationWrap,
}

impl CoordinateFrame {
    pub fn new(origin: Vec3, yaw: f32, wrap: RotationWrap) -> Self {
        Self { origin, yaw, wrap }
    }

    /// Origin and yaw for a cast attempt started by `mode`.
    ///
    /// One hand: origin and yaw of that hand.  Both hands: centre of the
    /// box spanned by the two hands, yaw of the head.
    pub fn anchor_for_cast(frame: &TrackingFrame, mode: HandMode) -> (Vec3, f32) {
        match mode {
            HandMode::Right => (frame.right.position, frame.right.rotation.yaw),
            HandMode::Left => (frame.left.position, frame.left.rotation.yaw),
            HandMode::Dual => {
                let min = frame.right.position.component_min(frame.left.position);
                let max = frame.right.position.component_max(frame.left.position);
                (min + (max - min) * 0.5, frame.head.rotation.yaw)
            }
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Re-anchor the grid, keeping the wrap policy.
    pub fn set_frame(&mut self, origin: Vec3, yaw: f32) {
        self.origin = origin;
        self.yaw = yaw;
    }

    /// World position into grid space.
    pub fn to_grid(&self, world: Vec3) -> Vec3 {
        (world - self.origin).rotate_yaw(-self.yaw)
    }

    /// World rotation into grid space, wrapped per axis.
    pub fn rotation_to_grid(&self, world: Rotator) -> Rotator {
        (world - Rotator::new(0.0, self.yaw, 0.0)).wrapped(self.wrap)
    }

    /// Grid position back into world space.
    pub fn to_world(&self, grid: Vec3) -> Vec3 {
        grid.rotate_yaw(self.yaw) + self.origin
    }

    /// Grid rotation back into world space (unwrapped).
    pub fn rotation_to_world(&self, grid: Rotator) -> Rotator {
        grid + Rotator::new(0.0, self.yaw, 0.0)
    }

    pub fn pose_to_grid(&self, pose: &HandPose) -> HandPose {
        HandPose::new(self.to_grid(pose.position), self.rotation_to_grid(pose.rotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).abs_max() < 1e-3, "expected {:?}, got {:?}", b, a);
    }

    fn pose(x: f32, y: f32, z: f32, yaw: f32) -> HandPose {
        HandPose::new(Vec3::new(x, y, z), Rotator::new(0.0, yaw, 0.0))
    }

    #[test]
    fn test_round_trip() {
        let frame = CoordinateFrame::new(Vec3::new(12.0, -4.0, 100.0), 37.0, RotationWrap::Strict);
        for p in [
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-250.0, 40.5, -0.25),
            Vec3::new(1000.0, 1000.0, 1000.0),
        ] {
            assert_close(frame.to_world(frame.to_grid(p)), p);
        }
    }

    #[test]
    fn test_to_grid_removes_yaw() {
        // Frame facing +Y: a point one unit along world +Y is one unit forward.
        let frame = CoordinateFrame::new(Vec3::ZERO, 90.0, RotationWrap::Strict);
        assert_close(frame.to_grid(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_to_grid_wraps() {
        let frame = CoordinateFrame::new(Vec3::ZERO, 170.0, RotationWrap::Strict);
        let rot = frame.rotation_to_grid(Rotator::new(10.0, -170.0, 0.0));
        assert_eq!(rot.pitch, 10.0);
        assert!((rot.yaw - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_legacy_band() {
        let frame = CoordinateFrame::new(Vec3::ZERO, 20.0, RotationWrap::Legacy);
        // -250 stays inside the legacy band, strict would fold it to 110.
        let rot = frame.rotation_to_grid(Rotator::new(0.0, -230.0, 0.0));
        assert_eq!(rot.yaw, -250.0);
    }

    #[test]
    fn test_single_hand_frame() {
        let tracking = TrackingFrame {
            right: pose(10.0, 20.0, 30.0, 45.0),
            left: pose(-10.0, 0.0, 0.0, -90.0),
            head: pose(0.0, 0.0, 170.0, 5.0),
        };
        let (origin, yaw) = CoordinateFrame::anchor_for_cast(&tracking, HandMode::Right);
        assert_eq!(origin, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(yaw, 45.0);
        let (_, yaw) = CoordinateFrame::anchor_for_cast(&tracking, HandMode::Left);
        assert_eq!(yaw, -90.0);
    }

    #[test]
    fn test_dual_hand_frame_uses_midpoint_and_head_yaw() {
        let tracking = TrackingFrame {
            right: pose(10.0, 20.0, 30.0, 45.0),
            left: pose(-10.0, 0.0, 50.0, -90.0),
            head: pose(0.0, 0.0, 170.0, 5.0),
        };
        let (origin, yaw) = CoordinateFrame::anchor_for_cast(&tracking, HandMode::Dual);
        assert_close(origin, Vec3::new(0.0, 10.0, 40.0));
        assert_eq!(yaw, 5.0);
    }

    #[test]
    fn test_set_frame_keeps_wrap() {
        let mut frame = CoordinateFrame::new(Vec3::ZERO, 0.0, RotationWrap::Legacy);
        frame.set_frame(Vec3::new(1.0, 1.0, 1.0), 90.0);
        assert_close(frame.to_grid(Vec3::new(1.0, 1.0, 1.0)), Vec3::ZERO);
        assert_eq!(frame.yaw(), 90.0);
        assert_eq!(frame, CoordinateFrame::new(Vec3::new(1.0, 1.0, 1.0), 90.0, RotationWrap::Legacy));
    }
}
