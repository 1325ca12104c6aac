//! Gesture templates and the compiled-in spell catalog.
//!
//! A template is an ordered list of keypoints, each holding a unit-scale
//! target pose per hand.  Positions are multiplied by the live scale at
//! match time; rotations are absolute grid-space degrees.  Templates are
//! validated once when the library is built and never change afterwards.

use std::collections::HashSet;
use std::fmt;

use super::hands::{Hand, HandPose};
use super::math::{Rotator, Vec3};

// ── Spell identifiers ──────────────────────────────────────

/// Every recognizable spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpellId {
    Ball,
    Wall,
    Beam,
    Atune,
    Air,
    Water,
    Earth,
    Fire,
    IncDur,
    DecDur,
    IncPwr,
    DecPwr,
    Explode,
    Magnet,
}

/// How the gameplay layer groups spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellCategory {
    /// Shapes held in a hand until launched.
    Base,
    /// Elements applied to the next launched shape.
    Element,
    /// Power and duration modifiers.
    Modifier,
}

impl SpellCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Element => "element",
            Self::Modifier => "modifier",
        }
    }
}

impl SpellId {
    pub const ALL: [SpellId; 14] = [
        Self::Ball,
        Self::Wall,
        Self::Beam,
        Self::Atune,
        Self::Air,
        Self::Water,
        Self::Earth,
        Self::Fire,
        Self::IncDur,
        Self::DecDur,
        Self::IncPwr,
        Self::DecPwr,
        Self::Explode,
        Self::Magnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ball => "ball",
            Self::Wall => "wall",
            Self::Beam => "beam",
            Self::Atune => "atune",
            Self::Air => "air",
            Self::Water => "water",
            Self::Earth => "earth",
            Self::Fire => "fire",
            Self::IncDur => "inc-dur",
            Self::DecDur => "dec-dur",
            Self::IncPwr => "inc-pwr",
            Self::DecPwr => "dec-pwr",
            Self::Explode => "explode",
            Self::Magnet => "magnet",
        }
    }

    pub fn from_str(s: &str) -> Option<SpellId> {
        Self::ALL.iter().copied().find(|id| id.as_str() == s)
    }

    pub fn category(&self) -> SpellCategory {
        match self {
            Self::Ball | Self::Wall | Self::Beam | Self::Atune => SpellCategory::Base,
            Self::Air | Self::Water | Self::Earth | Self::Fire => SpellCategory::Element,
            _ => SpellCategory::Modifier,
        }
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Keypoints ──────────────────────────────────────────────

/// How a hand travels from the previous keypoint to this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// No positional change; only rotation may differ.
    Stationary,
    /// Straight line, changing at most two tolerance-checked axes.
    Line,
    /// Quarter-circle arc.  Reserved: no evaluator exists and the library
    /// rejects templates that use it.
    Arc,
}

impl MotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stationary => "stationary",
            Self::Line => "line",
            Self::Arc => "arc",
        }
    }
}

/// One checkpoint along a gesture path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPoint {
    pub right: HandPose,
    pub left: HandPose,
    pub motion: MotionKind,
}

impl KeyPoint {
    pub fn new(right: HandPose, left: HandPose, motion: MotionKind) -> Self {
        Self { right, left, motion }
    }

    /// Target pose for `hand`.
    pub fn target(&self, hand: Hand) -> &HandPose {
        match hand {
            Hand::Right => &self.right,
            Hand::Left => &self.left,
        }
    }
}

// ── Templates ──────────────────────────────────────────────

/// Where a template's live scale comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleSource {
    /// Largest per-axis hand displacement until the first leg is done.
    #[default]
    Displacement,
    /// Distance between the hands at cast start, locked immediately.
    HandSpan,
}

/// A complete gesture for one spell.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTemplate {
    spell: SpellId,
    key_points: Vec<KeyPoint>,
    start_offset: Vec3,
    positional_tolerance: Vec3,
    rotational_tolerance: Rotator,
    dual_only: bool,
    scale_source: ScaleSource,
}

impl GestureTemplate {
    /// `start_offset` is the required direction from the left hand to the
    /// right hand at cast start.  Tolerance axes set to zero are ignored.
    pub fn new(
        spell: SpellId,
        key_points: Vec<KeyPoint>,
        start_offset: Vec3,
        positional_tolerance: Vec3,
        rotational_tolerance: Rotator,
        dual_only: bool,
    ) -> Self {
        Self {
            spell,
            key_points,
            start_offset,
            positional_tolerance,
            rotational_tolerance,
            dual_only,
            scale_source: ScaleSource::Displacement,
        }
    }

    pub fn with_scale_source(mut self, source: ScaleSource) -> Self {
        self.scale_source = source;
        self
    }

    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn key_points(&self) -> &[KeyPoint] {
        &self.key_points
    }

    pub fn key_point(&self, index: usize) -> &KeyPoint {
        &self.key_points[index]
    }

    pub fn last_index(&self) -> usize {
        self.key_points.len() - 1
    }

    pub fn start_offset(&self) -> Vec3 {
        self.start_offset
    }

    pub fn positional_tolerance(&self) -> Vec3 {
        self.positional_tolerance
    }

    pub fn rotational_tolerance(&self) -> Rotator {
        self.rotational_tolerance
    }

    pub fn dual_only(&self) -> bool {
        self.dual_only
    }

    pub fn scale_source(&self) -> ScaleSource {
        self.scale_source
    }

    fn validate(&self) -> Result<(), LibraryError> {
        let spell = self.spell;
        if self.key_points.len() < 2 {
            return Err(LibraryError::TooFewKeyPoints {
                spell,
                count: self.key_points.len(),
            });
        }
        let negative = self.positional_tolerance.to_array().iter().any(|t| *t < 0.0)
            || self.rotational_tolerance.to_array().iter().any(|t| *t < 0.0);
        if negative {
            return Err(LibraryError::NegativeTolerance { spell });
        }
        if self.scale_source == ScaleSource::HandSpan && !self.dual_only {
            return Err(LibraryError::HandSpanRequiresDual { spell });
        }
        for hand in Hand::ALL {
            if self.key_points[0].target(hand).position != Vec3::ZERO {
                return Err(LibraryError::NonZeroStart { spell, hand });
            }
        }

        let tol = self.positional_tolerance.to_array();
        for (index, kp) in self.key_points.iter().enumerate() {
            match kp.motion {
                MotionKind::Arc => {
                    return Err(LibraryError::UnsupportedMotion {
                        spell,
                        index,
                        motion: kp.motion,
                    });
                }
                MotionKind::Line if index > 0 => {
                    let prev = &self.key_points[index - 1];
                    for hand in Hand::ALL {
                        let delta =
                            (kp.target(hand).position - prev.target(hand).position).to_array();
                        let moving = (0..3).filter(|a| tol[*a] != 0.0 && delta[*a] != 0.0).count();
                        if moving > 2 {
                            return Err(LibraryError::TooManyMovingAxes { spell, index, hand });
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ── Errors ─────────────────────────────────────────────────

/// Template authoring mistakes, caught when the library is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LibraryError {
    #[error("{spell}: a gesture needs at least two keypoints, found {count}")]
    TooFewKeyPoints { spell: SpellId, count: usize },

    #[error("{spell}: first keypoint of the {} hand must sit at the start position", .hand.as_str())]
    NonZeroStart { spell: SpellId, hand: Hand },

    #[error("{spell}: keypoint {index} moves the {} hand along three axes", .hand.as_str())]
    TooManyMovingAxes {
        spell: SpellId,
        index: usize,
        hand: Hand,
    },

    #[error("{spell}: keypoint {index} uses unsupported motion '{}'", .motion.as_str())]
    UnsupportedMotion {
        spell: SpellId,
        index: usize,
        motion: MotionKind,
    },

    #[error("{spell}: tolerances must not be negative")]
    NegativeTolerance { spell: SpellId },

    #[error("{spell}: hand-span scaling requires a dual-hand-only gesture")]
    HandSpanRequiresDual { spell: SpellId },

    #[error("{0}: defined more than once")]
    DuplicateSpell(SpellId),
}

// ── Library ────────────────────────────────────────────────

/// Immutable, validated catalog of gesture templates.
#[derive(Debug, Clone)]
pub struct GestureLibrary {
    templates: Vec<GestureTemplate>,
}

impl GestureLibrary {
    /// Validate and wrap `templates`.  Order is preserved and defines the
    /// template index used by the matcher.
    pub fn new(templates: Vec<GestureTemplate>) -> Result<Self, LibraryError> {
        let mut seen = HashSet::new();
        for template in &templates {
            template.validate()?;
            if !seen.insert(template.spell) {
                return Err(LibraryError::DuplicateSpell(template.spell));
            }
        }
        Ok(Self { templates })
    }

    /// The full compiled-in spell set.
    pub fn builtin() -> Result<Self, LibraryError> {
        Self::new(builtin_templates())
    }

    pub fn templates(&self) -> &[GestureTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, spell: SpellId) -> Option<&GestureTemplate> {
        self.templates.iter().find(|t| t.spell == spell)
    }

    pub fn index_of(&self, spell: SpellId) -> Option<usize> {
        self.templates.iter().position(|t| t.spell == spell)
    }

    /// Generate s-expression listing every template.
    pub fn to_sexp(&self) -> String {
        let mut s = String::from("(");
        for (i, t) in self.templates.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&format!(
                "(:spell :{} :category :{} :keypoints {} :dual-only {} :scale :{})",
                t.spell.as_str(),
                t.spell.category().as_str(),
                t.key_points.len(),
                if t.dual_only { "t" } else { "nil" },
                match t.scale_source {
                    ScaleSource::Displacement => "displacement",
                    ScaleSource::HandSpan => "hand-span",
                },
            ));
        }
        s.push(')');
        s
    }
}

// ── Built-in spells ────────────────────────────────────────

fn kp(
    right: [f32; 3],
    right_rot: [f32; 3],
    left: [f32; 3],
    left_rot: [f32; 3],
    motion: MotionKind,
) -> KeyPoint {
    KeyPoint::new(
        HandPose::new(Vec3::from_array(right), Rotator::from_array(right_rot)),
        HandPose::new(Vec3::from_array(left), Rotator::from_array(left_rot)),
        motion,
    )
}

fn start(right_rot: [f32; 3], left_rot: [f32; 3]) -> KeyPoint {
    kp([0.0; 3], right_rot, [0.0; 3], left_rot, MotionKind::Stationary)
}

fn template(
    spell: SpellId,
    key_points: Vec<KeyPoint>,
    start_offset: [f32; 3],
    positional: [f32; 3],
    rotational: [f32; 3],
    dual_only: bool,
) -> GestureTemplate {
    GestureTemplate::new(
        spell,
        key_points,
        Vec3::from_array(start_offset),
        Vec3::from_array(positional),
        Rotator::from_array(rotational),
        dual_only,
    )
}

/// Unit-scale gesture data.  X forward, Y right, Z up; rotations are
/// `[pitch, yaw, roll]`.
fn builtin_templates() -> Vec<GestureTemplate> {
    use MotionKind::{Line, Stationary};
    const Z: [f32; 3] = [0.0, 0.0, 0.0];
    const ACROSS: [f32; 3] = [0.0, 1.0, 0.0];
    const ALL_AXES: [f32; 3] = [1.0, 1.0, 1.0];

    vec![
        // Hands sweep down and out, cross over, and return.
        template(
            SpellId::Ball,
            vec![
                start(Z, Z),
                kp([0.0, 0.5, -1.0], Z, [0.0, -0.5, -1.0], Z, Line),
                kp([0.0, -0.5, -1.0], Z, [0.0, 0.5, -1.0], Z, Line),
                kp(Z, Z, Z, Z, Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 45.0, 30.0],
            false,
        ),
        template(
            SpellId::Wall,
            vec![
                start([0.0, 0.0, -90.0], [0.0, 0.0, 90.0]),
                kp([0.0, 1.0, 0.0], [0.0, 0.0, -90.0], [0.0, -1.0, 0.0], [0.0, 0.0, 90.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [45.0, 0.0, 30.0],
            false,
        ),
        // Punch forward while twisting the wrist.
        template(
            SpellId::Beam,
            vec![
                start(Z, Z),
                kp([1.0, 0.0, 0.0], [0.0, 0.0, -90.0], [1.0, 0.0, 0.0], [0.0, 0.0, 90.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [45.0, 0.0, 30.0],
            false,
        ),
        template(
            SpellId::Atune,
            vec![
                start([0.0, 0.0, 90.0], [0.0, 0.0, -90.0]),
                kp([-1.0, -1.0, 0.75], [60.0, -90.0, 0.0], [-1.0, 0.95, 0.75], [60.0, 90.0, 0.0], Line),
            ],
            ACROSS,
            [0.0, 1.0, 1.0],
            [45.0, 45.0, 45.0],
            false,
        ),
        // Counter-rotating hands; sized by how far apart they start.
        template(
            SpellId::Air,
            vec![
                start([0.0, -90.0, -90.0], [0.0, 90.0, 90.0]),
                kp([-0.5, 0.0, -0.5], [0.0, -90.0, -90.0], [0.5, 0.0, 0.5], [0.0, 90.0, 90.0], Line),
                kp([-1.0, 0.0, 0.0], [0.0, -90.0, -90.0], [1.0, 0.0, 0.0], [0.0, 90.0, 90.0], Line),
                kp([-0.5, 0.0, 0.5], [0.0, -90.0, -90.0], [0.5, 0.0, -0.5], [0.0, 90.0, 90.0], Line),
                kp(Z, [0.0, -90.0, -90.0], Z, [0.0, 90.0, 90.0], Line),
            ],
            [1.0, 0.0, 0.0],
            ALL_AXES,
            [0.0, 45.0, 45.0],
            true,
        )
        .with_scale_source(ScaleSource::HandSpan),
        template(
            SpellId::Water,
            vec![
                start(Z, Z),
                kp([0.0, 1.0, -1.0], Z, [0.0, -1.0, -1.0], Z, Line),
                kp([0.0, 1.0, 0.0], Z, [0.0, -1.0, 0.0], Z, Line),
                kp([0.0, 2.0, -1.0], Z, [0.0, -2.0, -1.0], Z, Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 0.0, 45.0],
            true,
        ),
        template(
            SpellId::Earth,
            vec![
                start([0.0, 0.0, -90.0], [0.0, 0.0, 90.0]),
                kp([0.0, 0.0, 1.0], [0.0, 0.0, -90.0], [0.0, 0.0, 1.0], [0.0, 0.0, 90.0], Line),
                kp([0.0, 0.0, 1.0], Z, [0.0, 0.0, 1.0], Z, Stationary),
                kp([0.0, -1.0, 1.0], Z, [0.0, 1.0, 1.0], Z, Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 30.0, 30.0],
            true,
        ),
        template(
            SpellId::Fire,
            vec![
                start(Z, Z),
                kp([0.0, -1.0, 1.0], Z, [0.0, 1.0, 1.0], Z, Line),
                kp([0.0, -0.5, 1.5], Z, [0.0, 0.5, 1.5], Z, Line),
                kp([0.0, -1.0, 2.0], Z, [0.0, 1.0, 2.0], Z, Line),
            ],
            ACROSS,
            ALL_AXES,
            [45.0, 0.0, 30.0],
            true,
        ),
        // Palms up, arc outwards, palms down.
        template(
            SpellId::IncDur,
            vec![
                start([0.0, 0.0, 90.0], [0.0, 0.0, -90.0]),
                kp([0.0, 1.0, 1.0], Z, [0.0, -1.0, 1.0], Z, Line),
                kp([0.0, 2.0, 0.0], [0.0, 0.0, -90.0], [0.0, -2.0, 0.0], [0.0, 0.0, 90.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 0.0, 30.0],
            true,
        ),
        template(
            SpellId::DecDur,
            vec![
                start([0.0, 0.0, -90.0], [0.0, 0.0, 90.0]),
                kp([0.0, -1.0, 1.0], Z, [0.0, 1.0, 1.0], Z, Line),
                kp([0.0, -1.0, 0.0], [0.0, 0.0, 90.0], [0.0, 1.0, 0.0], [0.0, 0.0, -90.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 0.0, 30.0],
            true,
        ),
        template(
            SpellId::IncPwr,
            vec![
                start([0.0, 0.0, -135.0], [0.0, 0.0, 135.0]),
                kp([0.0, -1.0, 1.0], [0.0, 0.0, -135.0], [0.0, 1.0, 1.0], [0.0, 0.0, 135.0], Line),
                kp([0.0, -1.0, 1.0], [0.0, 0.0, -45.0], [0.0, 1.0, 1.0], [0.0, 0.0, 45.0], Stationary),
                kp([0.0, 0.0, 2.0], [0.0, 0.0, -45.0], [0.0, 0.0, 2.0], [0.0, 0.0, 45.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 0.0, 40.0],
            true,
        ),
        template(
            SpellId::DecPwr,
            vec![
                start([0.0, 0.0, -135.0], [0.0, 0.0, 135.0]),
                kp([0.0, 1.0, -1.0], [0.0, 0.0, -135.0], [0.0, -1.0, -1.0], [0.0, 0.0, 135.0], Line),
                kp([0.0, 1.0, -1.0], [0.0, 0.0, -45.0], [0.0, -1.0, -1.0], [0.0, 0.0, 45.0], Stationary),
                kp([0.0, 0.0, -2.0], [0.0, 0.0, -45.0], [0.0, 0.0, -2.0], [0.0, 0.0, 45.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 0.0, 40.0],
            true,
        ),
        template(
            SpellId::Explode,
            vec![
                start([0.0, -90.0, -90.0], [0.0, 90.0, 0.0]),
                kp([0.0, -1.0, 0.0], [0.0, -90.0, -90.0], [0.0, 1.0, 0.0], [0.0, 90.0, 0.0], Line),
                kp([0.0, -1.0, 0.0], [0.0, -90.0, 0.0], [0.0, 1.0, 0.0], [0.0, 90.0, 90.0], Stationary),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 40.0, 30.0],
            true,
        ),
        template(
            SpellId::Magnet,
            vec![
                start([0.0, -90.0, 0.0], [0.0, 90.0, 90.0]),
                kp(Z, [0.0, -90.0, -90.0], Z, [0.0, 90.0, 0.0], Stationary),
                kp([0.0, 1.0, 0.0], [0.0, -90.0, -90.0], [0.0, -1.0, 0.0], [0.0, 90.0, 0.0], Line),
            ],
            ACROSS,
            ALL_AXES,
            [0.0, 40.0, 30.0],
            true,
        ),
    ]
}

// ── Tests ──────────────────────────────────────────────────
