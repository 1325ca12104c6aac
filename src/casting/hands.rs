//! Tracked hand and head poses as delivered by the controller layer.
//!
//! One `TrackingFrame` is a frozen snapshot: every check within a frame
//! reads from the same frame, never from live device state.

use super::math::{Rotator, Vec3};

// ── Hand enum ──────────────────────────────────────────────

/// Which hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Evaluation order within a frame.
    pub const ALL: [Hand; 2] = [Hand::Right, Hand::Left];

    /// Index into per-hand arrays.
    pub fn index(&self) -> usize {
        match self {
            Self::Right => 0,
            Self::Left => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn from_str(s: &str) -> Option<Hand> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

// ── Hand mode ──────────────────────────────────────────────

/// The set of hands taking part in a cast or launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandMode {
    Right,
    Left,
    Dual,
}

impl HandMode {
    /// Derive from per-hand flags.  `None` when neither hand is active.
    pub fn from_flags(right: bool, left: bool) -> Option<HandMode> {
        match (right, left) {
            (true, true) => Some(Self::Dual),
            (true, false) => Some(Self::Right),
            (false, true) => Some(Self::Left),
            (false, false) => None,
        }
    }

    pub fn includes(&self, hand: Hand) -> bool {
        match self {
            Self::Dual => true,
            Self::Right => hand == Hand::Right,
            Self::Left => hand == Hand::Left,
        }
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, Self::Dual)
    }

    /// Participating hands in evaluation order.
    pub fn hands(self) -> impl Iterator<Item = Hand> {
        Hand::ALL.into_iter().filter(move |h| self.includes(*h))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
            Self::Dual => "dual",
        }
    }
}

// ── Poses ──────────────────────────────────────────────────

/// Position and rotation of one tracked device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandPose {
    pub position: Vec3,
    pub rotation: Rotator,
}

impl HandPose {
    pub const fn new(position: Vec3, rotation: Rotator) -> Self {
        Self { position, rotation }
    }
}

/// World-space snapshot of both hands and the head for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackingFrame {
    pub right: HandPose,
    pub left: HandPose,
    pub head: HandPose,
}

impl TrackingFrame {
    pub fn hand(&self, hand: Hand) -> &HandPose {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}
