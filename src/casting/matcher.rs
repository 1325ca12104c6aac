//! Per-frame gesture matching.
//!
//! The matcher keeps one [`TemplateState`] per library template, indexed
//! in library order.  A cast attempt starts with [`GestureMatcher::begin`],
//! which captures the grid and rejects every template whose first keypoint
//! does not fit the starting pose.  Each following frame goes through
//! [`GestureMatcher::advance`]: casting hands move independently through
//! their keypoints, templates whose motion envelope is left are rejected,
//! and the first template to finish on every casting hand wins.

use std::sync::Arc;

use tracing::{debug, info, trace};

use super::config::CastingConfig;
use super::frame::CoordinateFrame;
use super::hands::{Hand, HandMode, HandPose, TrackingFrame};
use super::library::{GestureLibrary, GestureTemplate, MotionKind, ScaleSource, SpellId};
use super::math::{distance_factor, Vec3};
use super::scale::{lock_lead, ScaleEstimator};
use super::tolerance;
use super::format_event;

// ── State ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    /// Still viable.
    Pending,
    /// Out for the rest of this attempt.
    Rejected,
    /// Completed on every casting hand.
    Matched,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rejected => "rejected",
            Self::Matched => "matched",
        }
    }
}

/// Attempt-scoped progress for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateState {
    status: TemplateStatus,
    scale: ScaleEstimator,
    /// Keypoint completion, indexed by `Hand::index()`.
    completed: [Vec<bool>; 2],
}

impl TemplateState {
    fn new(template: &GestureTemplate, min_scale: f32) -> Self {
        let n = template.key_points().len();
        Self {
            status: TemplateStatus::Pending,
            scale: ScaleEstimator::new(min_scale),
            completed: [vec![false; n], vec![false; n]],
        }
    }

    fn reset(&mut self) {
        self.status = TemplateStatus::Pending;
        self.scale.reset();
        for flags in &mut self.completed {
            flags.fill(false);
        }
    }

    pub fn status(&self) -> TemplateStatus {
        self.status
    }

    pub fn scale(&self) -> f32 {
        self.scale.scale()
    }

    pub fn scale_locked(&self) -> bool {
        self.scale.is_locked()
    }

    pub fn is_completed(&self, hand: Hand, index: usize) -> bool {
        self.completed[hand.index()].get(index).copied().unwrap_or(false)
    }

    /// First keypoint not yet reached by `hand`, or the last one when the
    /// hand has finished.
    pub fn next_index(&self, hand: Hand) -> usize {
        let flags = &self.completed[hand.index()];
        flags
            .iter()
            .position(|done| !done)
            .unwrap_or(flags.len().saturating_sub(1))
    }

    fn is_finished(&self, hand: Hand) -> bool {
        self.completed[hand.index()].iter().all(|done| *done)
    }
}

// ── Results ────────────────────────────────────────────────

/// What the gameplay layer sees each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Nothing viable.
    None,
    /// More than one template still viable.
    Ambiguous,
    /// Exactly one template viable or matched.
    Spell(SpellId),
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ambiguous => "ambiguous",
            Self::Spell(id) => id.as_str(),
        }
    }
}

/// Result of [`GestureMatcher::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// This many templates fit the starting pose.
    Viable(usize),
    /// No template can start from this pose.
    NoViableTemplate,
}

/// Result of [`GestureMatcher::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// At least one template is still in progress.
    Pending,
    /// A template finished this frame.
    Complete(SpellId),
    /// Every template has been rejected.
    Exhausted,
}

/// Progress notifications for a presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    KeypointCompleted {
        spell: SpellId,
        index: usize,
        hand: Hand,
    },
    TemplateRejected {
        spell: SpellId,
    },
    ScaleLocked {
        spell: SpellId,
        scale: f32,
    },
    TemplateMatched {
        spell: SpellId,
    },
}

impl MatchEvent {
    pub fn to_sexp(&self) -> String {
        match self {
            Self::KeypointCompleted { spell, index, hand } => format_event(
                "keypoint-completed",
                &[
                    ("spell", &format!(":{}", spell.as_str())),
                    ("index", &index.to_string()),
                    ("hand", &format!(":{}", hand.as_str())),
                ],
            ),
            Self::TemplateRejected { spell } => {
                format_event("template-rejected", &[("spell", &format!(":{}", spell.as_str()))])
            }
            Self::ScaleLocked { spell, scale } => format_event(
                "scale-locked",
                &[
                    ("spell", &format!(":{}", spell.as_str())),
                    ("scale", &format!("{:.2}", scale)),
                ],
            ),
            Self::TemplateMatched { spell } => {
                format_event("template-matched", &[("spell", &format!(":{}", spell.as_str()))])
            }
        }
    }
}

/// World-space target for one (template, keypoint, hand).
#[derive(Debug, Clone, PartialEq)]
pub struct GuidePoint {
    pub spell: SpellId,
    pub index: usize,
    pub hand: Hand,
    pub pose: HandPose,
    /// The hand is currently heading for this keypoint.
    pub targeted: bool,
}

// ── Checks ─────────────────────────────────────────────────

/// Frozen grid-space snapshot used for every check in one frame.
struct Evaluation<'a> {
    config: &'a CastingConfig,
    starts: &'a [HandPose; 2],
    poses: &'a [HandPose; 2],
}

impl Evaluation<'_> {
    fn displacement(&self, hand: Hand) -> Vec3 {
        self.poses[hand.index()].position - self.starts[hand.index()].position
    }

    /// The hand has arrived at keypoint `index`.
    fn at_key_point(&self, template: &GestureTemplate, hand: Hand, index: usize, scale: f32) -> bool {
        let target = template.key_point(index).target(hand);
        let pose = &self.poses[hand.index()];
        tolerance::rotation_in_tolerance(
            pose.rotation,
            target.rotation,
            template.rotational_tolerance(),
            self.config.rotation_wrap,
        ) && tolerance::position_in_tolerance(
            pose.position,
            target.position * scale + self.starts[hand.index()].position,
            template.positional_tolerance() * self.config.static_tolerance_factor(),
        )
    }

    /// The hand is still inside the envelope of the leg ending at `index`.
    fn on_leg(&self, template: &GestureTemplate, hand: Hand, index: usize, scale: f32) -> bool {
        let target = template.key_point(index);
        let previous = template.key_point(index.saturating_sub(1)).target(hand);
        let end = target.target(hand);
        let pose = &self.poses[hand.index()];
        let envelope = template.positional_tolerance() * self.config.max_move_tolerance;

        let rotation_ok = tolerance::rotation_path_in_tolerance(
            pose.rotation,
            previous.rotation,
            end.rotation,
            template.rotational_tolerance(),
        );
        if !rotation_ok {
            return false;
        }

        let relative = self.displacement(hand);
        match target.motion {
            MotionKind::Stationary => {
                tolerance::position_in_tolerance(relative, end.position * scale, envelope)
            }
            MotionKind::Line => tolerance::line_path_in_tolerance(
                relative,
                previous.position * scale,
                end.position * scale,
                envelope,
            ),
            MotionKind::Arc => false,
        }
    }

    /// A finished hand waiting for the other one must stay near its
    /// final keypoint.
    fn holding(&self, template: &GestureTemplate, hand: Hand, scale: f32) -> bool {
        let target = template.key_point(template.last_index()).target(hand);
        let pose = &self.poses[hand.index()];
        tolerance::rotation_in_tolerance(
            pose.rotation,
            target.rotation,
            template.rotational_tolerance(),
            self.config.rotation_wrap,
        ) && tolerance::position_in_tolerance(
            self.displacement(hand),
            target.position * scale,
            template.positional_tolerance() * self.config.max_move_tolerance,
        )
    }

    /// Why `template` cannot start from the captured pose, if it cannot.
    fn setup_rejection(&self, template: &GestureTemplate, mode: HandMode, scale: f32) -> Option<&'static str> {
        if template.dual_only() && !mode.is_dual() {
            return Some("needs both hands");
        }
        if mode.hands().any(|hand| !self.at_key_point(template, hand, 0, scale)) {
            return Some("start pose out of tolerance");
        }
        if mode.is_dual() {
            let offset = self.starts[Hand::Right.index()].position - self.starts[Hand::Left.index()].position;
            let band = (template.positional_tolerance() * self.config.max_move_tolerance).abs_max();
            if !tolerance::relative_direction_in_tolerance(offset, template.start_offset(), band) {
                return Some("hands placed wrong relative to each other");
            }
        }
        None
    }
}

// ── Matcher ────────────────────────────────────────────────

pub struct GestureMatcher {
    library: Arc<GestureLibrary>,
    config: CastingConfig,
    states: Vec<TemplateState>,
    frame: CoordinateFrame,
    /// Hands still contributing to the current attempt.
    mode: Option<HandMode>,
    /// Grid poses captured at `begin`.
    starts: [HandPose; 2],
    /// Grid poses of the latest frame.
    poses: [HandPose; 2],
    events: Vec<MatchEvent>,
}

impl GestureMatcher {
    pub fn new(library: Arc<GestureLibrary>, config: CastingConfig) -> Self {
        let states = library
            .templates()
            .iter()
            .map(|t| TemplateState::new(t, config.min_move_scale))
            .collect();
        Self {
            frame: CoordinateFrame::new(Vec3::ZERO, 0.0, config.rotation_wrap),
            library,
            config,
            states,
            mode: None,
            starts: [HandPose::default(); 2],
            poses: [HandPose::default(); 2],
            events: Vec::new(),
        }
    }

    pub fn library(&self) -> &GestureLibrary {
        &self.library
    }

    pub fn config(&self) -> &CastingConfig {
        &self.config
    }

    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    /// Hands contributing to the current attempt, if one is running.
    pub fn mode(&self) -> Option<HandMode> {
        self.mode
    }

    pub fn states(&self) -> &[TemplateState] {
        &self.states
    }

    pub fn state(&self, spell: SpellId) -> Option<&TemplateState> {
        self.library.index_of(spell).map(|i| &self.states[i])
    }

    pub fn status(&self, spell: SpellId) -> Option<TemplateStatus> {
        self.state(spell).map(|s| s.status)
    }

    /// Wipe every template back to Pending at minimum scale.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
        self.mode = None;
        self.frame.set_frame(Vec3::ZERO, 0.0);
        self.starts = [HandPose::default(); 2];
        self.poses = [HandPose::default(); 2];
        self.events.clear();
    }

    /// Start a cast attempt for `mode` from the poses in `frame`.
    pub fn begin(&mut self, frame: &TrackingFrame, mode: HandMode) -> SetupOutcome {
        self.reset();
        let (origin, yaw) = CoordinateFrame::anchor_for_cast(frame, mode);
        self.frame.set_frame(origin, yaw);
        for hand in Hand::ALL {
            let grid = self.frame.pose_to_grid(frame.hand(hand));
            self.starts[hand.index()] = grid;
            self.poses[hand.index()] = grid;
        }

        let library = Arc::clone(&self.library);
        let eval = Evaluation {
            config: &self.config,
            starts: &self.starts,
            poses: &self.poses,
        };
        let mut viable = 0;
        for (state, template) in self.states.iter_mut().zip(library.templates()) {
            if let Some(reason) = eval.setup_rejection(template, mode, state.scale.scale()) {
                debug!("{}: rejected at setup, {}", template.spell(), reason);
                state.status = TemplateStatus::Rejected;
                continue;
            }
            viable += 1;
            for hand in mode.hands() {
                state.completed[hand.index()][0] = true;
            }
            if template.scale_source() == ScaleSource::HandSpan {
                state.scale.lock_to_span(
                    self.starts[Hand::Right.index()].position,
                    self.starts[Hand::Left.index()].position,
                );
                self.events.push(MatchEvent::ScaleLocked {
                    spell: template.spell(),
                    scale: state.scale.scale(),
                });
            }
        }

        if viable == 0 {
            info!("No gesture can start from this pose ({})", mode.as_str());
            self.mode = None;
            return SetupOutcome::NoViableTemplate;
        }
        self.mode = Some(mode);
        debug!("Cast setup: {} candidate(s) for {}", viable, mode.as_str());
        SetupOutcome::Viable(viable)
    }

    /// Stop evaluating `hand`.  Returns the hands still casting.
    pub fn release(&mut self, hand: Hand) -> Option<HandMode> {
        self.mode = self.mode.and_then(|m| {
            HandMode::from_flags(
                m.includes(Hand::Right) && hand != Hand::Right,
                m.includes(Hand::Left) && hand != Hand::Left,
            )
        });
        self.mode
    }

    /// Evaluate one frame of hand motion.
    pub fn advance(&mut self, frame: &TrackingFrame) -> AdvanceOutcome {
        let Some(mode) = self.mode else {
            return AdvanceOutcome::Exhausted;
        };
        for hand in Hand::ALL {
            self.poses[hand.index()] = self.frame.pose_to_grid(frame.hand(hand));
        }

        let library = Arc::clone(&self.library);
        let eval = Evaluation {
            config: &self.config,
            starts: &self.starts,
            poses: &self.poses,
        };
        let mut winner = None;

        for (index, (state, template)) in self.states.iter_mut().zip(library.templates()).enumerate() {
            if state.status != TemplateStatus::Pending {
                continue;
            }
            let spell = template.spell();
            let last = template.last_index();

            if !state.scale.is_locked() {
                for hand in mode.hands() {
                    state.scale.observe(eval.displacement(hand));
                }
            }
            let scale = state.scale.scale();

            let mut finished = true;
            let mut in_envelope = true;
            for hand in mode.hands() {
                if state.is_finished(hand) {
                    in_envelope &= eval.holding(template, hand, scale);
                    continue;
                }
                let next = state.next_index(hand);
                if eval.at_key_point(template, hand, next, scale) {
                    state.completed[hand.index()][next] = true;
                    trace!("{}: keypoint {} reached by {} hand", spell, next, hand.as_str());
                    self.events.push(MatchEvent::KeypointCompleted { spell, index: next, hand });
                    finished &= next == last;
                } else {
                    finished = false;
                    in_envelope &= eval.on_leg(template, hand, next, scale);
                }
            }

            if finished {
                state.status = TemplateStatus::Matched;
                winner = Some(index);
                break;
            }
            if !in_envelope {
                debug!("{}: left its motion envelope", spell);
                state.status = TemplateStatus::Rejected;
                self.events.push(MatchEvent::TemplateRejected { spell });
                continue;
            }

            if !state.scale.is_locked() {
                let next_of = |hand: Hand| mode.includes(hand).then(|| state.next_index(hand));
                let lead = lock_lead(next_of(Hand::Right), next_of(Hand::Left));
                if let Some((hand, next)) = lead {
                    let moved_on = template.key_point(next - 1).motion != MotionKind::Stationary
                        && !eval.at_key_point(template, hand, next - 1, scale);
                    if moved_on && state.scale.lock() {
                        debug!("{}: scale locked at {:.2}", spell, scale);
                        self.events.push(MatchEvent::ScaleLocked { spell, scale });
                    }
                }
            }
        }

        if let Some(index) = winner {
            let spell = library.templates()[index].spell();
            for (i, state) in self.states.iter_mut().enumerate() {
                if i != index && state.status == TemplateStatus::Pending {
                    state.status = TemplateStatus::Rejected;
                    self.events.push(MatchEvent::TemplateRejected {
                        spell: library.templates()[i].spell(),
                    });
                }
            }
            info!("Gesture matched: {}", spell);
            self.events.push(MatchEvent::TemplateMatched { spell });
            return AdvanceOutcome::Complete(spell);
        }

        if self.pending_count() == 0 {
            debug!("All gestures rejected");
            return AdvanceOutcome::Exhausted;
        }
        AdvanceOutcome::Pending
    }

    pub fn pending_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| s.status == TemplateStatus::Pending)
            .count()
    }

    /// None, a single spell, or Ambiguous.
    pub fn classification(&self) -> Classification {
        let mut found = None;
        for (state, template) in self.states.iter().zip(self.library.templates()) {
            match state.status {
                TemplateStatus::Matched => return Classification::Spell(template.spell()),
                TemplateStatus::Pending if found.is_some() => return Classification::Ambiguous,
                TemplateStatus::Pending => found = Some(template.spell()),
                TemplateStatus::Rejected => {}
            }
        }
        found.map_or(Classification::None, Classification::Spell)
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// World-space targets for every keypoint still ahead of a casting
    /// hand on a Pending template.
    pub fn guide_points(&self) -> Vec<GuidePoint> {
        let Some(mode) = self.mode else {
            return Vec::new();
        };
        let mut points = Vec::new();
        for (state, template) in self.states.iter().zip(self.library.templates()) {
            if state.status != TemplateStatus::Pending {
                continue;
            }
            let scale = state.scale.scale();
            for hand in mode.hands() {
                let start = self.starts[hand.index()].position;
                for (index, kp) in template.key_points().iter().enumerate().skip(1) {
                    if state.is_completed(hand, index) {
                        continue;
                    }
                    let target = kp.target(hand);
                    points.push(GuidePoint {
                        spell: template.spell(),
                        index,
                        hand,
                        pose: HandPose::new(
                            self.frame.to_world(target.position * scale + start),
                            self.frame.rotation_to_world(target.rotation),
                        ),
                        targeted: state.is_completed(hand, index - 1),
                    });
                }
            }
        }
        points
    }

    /// Fraction of the current leg covered by `hand` on `spell`.
    ///
    /// `None` when the template is not Pending or the hand is not casting.
    /// Negative when the leg has no length (stationary keypoints).
    pub fn leg_progress(&self, spell: SpellId, hand: Hand) -> Option<f32> {
        let mode = self.mode?;
        if !mode.includes(hand) {
            return None;
        }
        let index = self.library.index_of(spell)?;
        let state = &self.states[index];
        if state.status != TemplateStatus::Pending {
            return None;
        }
        let template = &self.library.templates()[index];
        let next = state.next_index(hand);
        if next == 0 {
            return None;
        }
        let scale = state.scale.scale();
        let origin = self.starts[hand.index()].position;
        let from = template.key_point(next - 1).target(hand).position * scale + origin;
        let to = template.key_point(next).target(hand).position * scale + origin;
        Some(distance_factor(from, to, self.poses[hand.index()].position))
    }
}

// ── Tests ──────────────────────────────────────────────────
