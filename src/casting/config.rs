//! Tunable constants for gesture matching and cast timing.

use super::math::RotationWrap;

/// Configuration for the casting pipeline.
#[derive(Debug, Clone)]
pub struct CastingConfig {
    /// Enable cast processing.
    pub enabled: bool,
    /// Multiplier on a template's positional tolerance for motion envelopes.
    /// Keypoint arrival checks use half of this.
    pub max_move_tolerance: f32,
    /// Minimum (and initial) live gesture scale, in world units.
    pub min_move_scale: f32,
    /// Window (seconds) in which a second hand joins a cast or launch.
    pub max_dual_hand_delay_s: f32,
    /// Wraparound applied to grid-relative rotations.
    pub rotation_wrap: RotationWrap,
}

impl Default for CastingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_move_tolerance: 8.0,
            min_move_scale: 8.0,
            max_dual_hand_delay_s: 0.2,
            rotation_wrap: RotationWrap::Strict,
        }
    }
}

impl CastingConfig {
    /// Per-axis multiplier for keypoint arrival checks.
    pub fn static_tolerance_factor(&self) -> f32 {
        self.max_move_tolerance / 2.0
    }

    /// Generate s-expression for IPC config.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:enabled {} :max-move-tolerance {:.2} :min-move-scale {:.2} :max-dual-hand-delay {:.3} :rotation-wrap :{})",
            if self.enabled { "t" } else { "nil" },
            self.max_move_tolerance,
            self.min_move_scale,
            self.max_dual_hand_delay_s,
            self.rotation_wrap.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CastingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_move_tolerance, 8.0);
        assert_eq!(config.min_move_scale, 8.0);
        assert_eq!(config.static_tolerance_factor(), 4.0);
        assert_eq!(config.rotation_wrap, RotationWrap::Strict);
    }

    #[test]
    fn test_config_sexp() {
        let sexp = CastingConfig::default().to_sexp();
        assert!(sexp.contains(":enabled t"));
        assert!(sexp.contains(":max-move-tolerance 8.00"));
        assert!(sexp.contains(":max-dual-hand-delay 0.200"));
        assert!(sexp.contains(":rotation-wrap :strict"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}
