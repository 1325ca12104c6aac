//! Live gesture scale.
//!
//! Templates are authored at unit size; the player decides how big to
//! draw them.  Until the first leg is finished the scale follows the
//! largest per-axis displacement of the casting hands, then it locks.

use super::hands::Hand;
use super::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEstimator {
    minimum: f32,
    scale: f32,
    locked: bool,
}

impl ScaleEstimator {
    pub fn new(minimum: f32) -> Self {
        Self {
            minimum,
            scale: minimum,
            locked: false,
        }
    }

    /// Back to the minimum, unlocked.
    pub fn reset(&mut self) {
        self.scale = self.minimum;
        self.locked = false;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Grow to cover `displacement` (a hand's offset from its start).
    /// Never shrinks and does nothing once locked.
    pub fn observe(&mut self, displacement: Vec3) {
        if self.locked {
            return;
        }
        self.scale = self.scale.max(self.minimum).max(displacement.abs_max());
    }

    /// Size from the distance between the hands, locked immediately.
    pub fn lock_to_span(&mut self, right_start: Vec3, left_start: Vec3) {
        self.scale = self.minimum.max((right_start - left_start).length());
        self.locked = true;
    }

    /// Returns true if this call locked the scale.
    pub fn lock(&mut self) -> bool {
        let newly = !self.locked;
        self.locked = true;
        newly
    }
}

/// Hand whose progress decides when the scale locks, with its next
/// keypoint index.
///
/// The hand furthest along wins (right on a tie); a hand that is not
/// casting never leads.  `None` until some hand is past the start.
pub fn lock_lead(next_right: Option<usize>, next_left: Option<usize>) -> Option<(Hand, usize)> {
    let lead = match (next_right, next_left) {
        (Some(r), Some(l)) if l > r => (Hand::Left, l),
        (Some(r), _) => (Hand::Right, r),
        (None, Some(l)) => (Hand::Left, l),
        (None, None) => return None,
    };
    (lead.1 > 0).then_some(lead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_starts_at_minimum() {
        let est = ScaleEstimator::new(8.0);
        assert_eq!(est.scale(), 8.0);
        assert!(!est.is_locked());
    }

    #[test]
    fn test_scale_monotonic_until_locked() {
        let mut est = ScaleEstimator::new(8.0);
        let mut last = est.scale();
        for d in [3.0, 12.0, 9.0, -15.0, 4.0, 0.0] {
            est.observe(Vec3::new(0.0, d, 1.0));
            assert!(est.scale() >= last, "scale shrank from {} to {}", last, est.scale());
            last = est.scale();
        }
        assert_eq!(last, 15.0);

        assert!(est.lock());
        est.observe(Vec3::new(40.0, 0.0, 0.0));
        assert_eq!(est.scale(), 15.0);
        assert!(!est.lock());
    }

    #[test]
    fn test_hand_span() {
        let mut est = ScaleEstimator::new(8.0);
        est.lock_to_span(Vec3::new(0.0, 15.0, 0.0), Vec3::new(0.0, -15.0, 0.0));
        assert!(est.is_locked());
        assert_eq!(est.scale(), 30.0);

        est.reset();
        est.lock_to_span(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(est.scale(), 8.0);
    }

    #[test]
    fn test_reset() {
        let mut est = ScaleEstimator::new(8.0);
        est.observe(Vec3::new(20.0, 0.0, 0.0));
        est.lock();
        est.reset();
        assert_eq!(est, ScaleEstimator::new(8.0));
    }

    #[test]
    fn test_lock_lead() {
        assert_eq!(lock_lead(Some(0), Some(0)), None);
        assert_eq!(lock_lead(Some(2), Some(1)), Some((Hand::Right, 2)));
        assert_eq!(lock_lead(Some(1), Some(2)), Some((Hand::Left, 2)));
        assert_eq!(lock_lead(Some(1), Some(1)), Some((Hand::Right, 1)));
        assert_eq!(lock_lead(None, Some(1)), Some((Hand::Left, 1)));
        assert_eq!(lock_lead(None, None), None);
    }
}
