//! Bimanual spell gesture recognition.
//!
//! Per frame, [`session::CastingSession`] converts world-space hand poses
//! into the casting grid ([`frame`]), drives [`matcher::GestureMatcher`]
//! against the immutable [`library`], and reports classification and
//! completion events to gameplay.

pub mod config;
pub mod frame;
pub mod hands;
pub mod library;
pub mod matcher;
pub mod math;
pub mod scale;
pub mod session;
pub mod tolerance;

pub use config::CastingConfig;
pub use frame::CoordinateFrame;
pub use hands::{Hand, HandMode, HandPose, TrackingFrame};
pub use library::{GestureLibrary, GestureTemplate, KeyPoint, LibraryError, MotionKind, SpellCategory, SpellId};
pub use matcher::{AdvanceOutcome, Classification, GestureMatcher, GuidePoint, MatchEvent, SetupOutcome, TemplateStatus};
pub use math::{Rotator, RotationWrap, Vec3};
pub use session::{CastEvent, CastPhase, CastingSession};

/// Format an event as an s-expression plist.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let mut s = format!("(:type :event :event :{}", event_type);
    for (key, val) in fields {
        s.push_str(&format!(" :{} {}", key, val));
    }
    s.push(')');
    s
}
