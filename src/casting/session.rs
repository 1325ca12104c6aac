//! Cast orchestration: hand edges, the dual-hand window, launches.

use std::sync::Arc;

use tracing::{debug, info};

use super::config::CastingConfig;
use super::format_event;
use super::hands::{Hand, HandMode, TrackingFrame};
use super::library::{GestureLibrary, SpellId};
use super::matcher::{AdvanceOutcome, Classification, GestureMatcher, GuidePoint, MatchEvent, SetupOutcome};

// ── Phase ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastPhase {
    /// No hand is casting.
    Idle,
    /// One hand is casting; the other may still join.
    Waiting,
    /// Gesture matching is running.
    Active,
    /// A spell was cast; waiting for the hands to release.
    Spent,
    /// Nothing could be matched; waiting for the hands to release.
    Failed,
}

impl CastPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Spent => "spent",
            Self::Failed => "failed",
        }
    }
}

// ── Events ─────────────────────────────────────────────────

/// Events for the gameplay layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CastEvent {
    /// Matching began with this many candidate gestures.
    Started { hands: HandMode, candidates: usize },
    /// No gesture can start from the current pose.
    CannotCast { hands: HandMode },
    ClassificationChanged(Classification),
    /// Progress detail from the matcher.
    Gesture(MatchEvent),
    /// A spell was recognized.
    Completed { spell: SpellId, hands: HandMode },
    /// Every candidate was rejected mid-gesture.
    Aborted,
    /// Casting stopped before anything matched.
    Cancelled,
    Launch { hands: HandMode },
}

impl CastEvent {
    pub fn to_sexp(&self) -> String {
        match self {
            Self::Started { hands, candidates } => format_event(
                "cast-started",
                &[
                    ("hands", &format!(":{}", hands.as_str())),
                    ("candidates", &candidates.to_string()),
                ],
            ),
            Self::CannotCast { hands } => {
                format_event("cannot-cast", &[("hands", &format!(":{}", hands.as_str()))])
            }
            Self::ClassificationChanged(c) => {
                format_event("classification", &[("spell", &format!(":{}", c.as_str()))])
            }
            Self::Gesture(e) => e.to_sexp(),
            Self::Completed { spell, hands } => format_event(
                "cast-completed",
                &[
                    ("spell", &format!(":{}", spell.as_str())),
                    ("category", &format!(":{}", spell.category().as_str())),
                    ("hands", &format!(":{}", hands.as_str())),
                ],
            ),
            Self::Aborted => format_event("cast-aborted", &[]),
            Self::Cancelled => format_event("cast-cancelled", &[]),
            Self::Launch { hands } => {
                format_event("launch", &[("hands", &format!(":{}", hands.as_str()))])
            }
        }
    }
}

// ── Session ────────────────────────────────────────────────

/// One player's casting state.
pub struct CastingSession {
    config: CastingConfig,
    matcher: GestureMatcher,
    phase: CastPhase,
    /// Indexed by `Hand::index()`.
    casting: [bool; 2],
    /// Seconds since the last cast edge while one hand waits.
    cast_delay: f32,
    launch_hands: [bool; 2],
    launching: bool,
    launch_delay: f32,
    classification: Classification,
}

impl CastingSession {
    pub fn new(library: Arc<GestureLibrary>, config: CastingConfig) -> Self {
        Self {
            matcher: GestureMatcher::new(library, config.clone()),
            config,
            phase: CastPhase::Idle,
            casting: [false; 2],
            cast_delay: 0.0,
            launch_hands: [false; 2],
            launching: false,
            launch_delay: 0.0,
            classification: Classification::None,
        }
    }

    pub fn phase(&self) -> CastPhase {
        self.phase
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn matcher(&self) -> &GestureMatcher {
        &self.matcher
    }

    pub fn is_casting(&self, hand: Hand) -> bool {
        self.casting[hand.index()]
    }

    pub fn guide_points(&self) -> Vec<GuidePoint> {
        self.matcher.guide_points()
    }

    fn casting_mode(&self) -> Option<HandMode> {
        HandMode::from_flags(self.casting[Hand::Right.index()], self.casting[Hand::Left.index()])
    }

    /// A hand pressed cast.
    pub fn begin_cast(&mut self, hand: Hand) -> Vec<CastEvent> {
        if !self.config.enabled || self.casting[hand.index()] {
            return Vec::new();
        }
        match self.phase {
            CastPhase::Idle => {
                self.casting[hand.index()] = true;
                self.cast_delay = 0.0;
                self.phase = CastPhase::Waiting;
                debug!("Cast begun by {} hand", hand.as_str());
            }
            CastPhase::Waiting if self.cast_delay <= self.config.max_dual_hand_delay_s => {
                self.casting[hand.index()] = true;
                self.cast_delay = 0.0;
                debug!("{} hand joined the cast", hand.as_str());
            }
            _ => {
                debug!("Late {} hand ignored for this cast", hand.as_str());
            }
        }
        Vec::new()
    }

    /// A hand released cast.
    pub fn end_cast(&mut self, hand: Hand) -> Vec<CastEvent> {
        let mut events = Vec::new();
        if !self.casting[hand.index()] {
            return events;
        }
        self.casting[hand.index()] = false;
        let remaining = self.casting_mode();

        match self.phase {
            CastPhase::Active => {
                if self.matcher.release(hand).is_none() {
                    info!("Cast cancelled");
                    self.finish_attempt(&mut events);
                    events.push(CastEvent::Cancelled);
                    self.phase = CastPhase::Idle;
                }
            }
            _ if remaining.is_none() => self.phase = CastPhase::Idle,
            _ => {}
        }
        events
    }

    /// Drop every cast and launch in progress.
    pub fn cancel(&mut self) -> Vec<CastEvent> {
        let mut events = Vec::new();
        let was_casting = matches!(self.phase, CastPhase::Waiting | CastPhase::Active);
        self.casting = [false; 2];
        self.cast_delay = 0.0;
        self.launch_hands = [false; 2];
        self.launching = false;
        self.launch_delay = 0.0;
        self.finish_attempt(&mut events);
        self.phase = CastPhase::Idle;
        if was_casting {
            info!("Cast cancelled");
            events.push(CastEvent::Cancelled);
        }
        events
    }

    pub fn begin_launch(&mut self, hand: Hand) {
        if !self.launching {
            self.launch_delay = 0.0;
        }
        self.launch_hands[hand.index()] = true;
        self.launching = true;
    }

    /// Releasing either hand abandons a launch that has not fired yet.
    pub fn end_launch(&mut self, hand: Hand) {
        self.launch_hands[hand.index()] = false;
        self.launching = false;
    }

    /// Process one frame of tracking data.
    pub fn update(&mut self, frame: &TrackingFrame, dt: f32) -> Vec<CastEvent> {
        let mut events = Vec::new();
        if !self.config.enabled {
            return events;
        }
        self.update_launch(dt, &mut events);

        match self.phase {
            CastPhase::Waiting => match self.casting_mode() {
                Some(HandMode::Dual) => self.start_attempt(frame, HandMode::Dual, &mut events),
                Some(single) => {
                    self.cast_delay += dt;
                    if self.cast_delay > self.config.max_dual_hand_delay_s {
                        self.start_attempt(frame, single, &mut events);
                    }
                }
                None => self.phase = CastPhase::Idle,
            },
            CastPhase::Active => self.advance_attempt(frame, &mut events),
            _ => {}
        }
        events
    }

    fn update_launch(&mut self, dt: f32, events: &mut Vec<CastEvent>) {
        if !self.launching {
            return;
        }
        let right = self.launch_hands[Hand::Right.index()];
        let left = self.launch_hands[Hand::Left.index()];
        if !(right && left) && self.launch_delay <= self.config.max_dual_hand_delay_s {
            self.launch_delay += dt;
            return;
        }
        if let Some(hands) = HandMode::from_flags(right, left) {
            info!("Launch with {} hand(s)", hands.as_str());
            events.push(CastEvent::Launch { hands });
        }
        self.launch_hands = [false; 2];
        self.launching = false;
    }

    fn start_attempt(&mut self, frame: &TrackingFrame, hands: HandMode, events: &mut Vec<CastEvent>) {
        match self.matcher.begin(frame, hands) {
            SetupOutcome::Viable(candidates) => {
                info!("Casting with {} hand(s), {} candidate(s)", hands.as_str(), candidates);
                self.phase = CastPhase::Active;
                events.push(CastEvent::Started { hands, candidates });
                self.drain_matcher(events);
                self.report_classification(events);
            }
            SetupOutcome::NoViableTemplate => {
                self.phase = CastPhase::Failed;
                events.push(CastEvent::CannotCast { hands });
                self.matcher.reset();
            }
        }
    }

    fn advance_attempt(&mut self, frame: &TrackingFrame, events: &mut Vec<CastEvent>) {
        let hands = self.matcher.mode();
        let outcome = self.matcher.advance(frame);
        self.drain_matcher(events);
        self.report_classification(events);

        match outcome {
            AdvanceOutcome::Pending => {}
            AdvanceOutcome::Complete(spell) => {
                if let Some(hands) = hands {
                    events.push(CastEvent::Completed { spell, hands });
                }
                self.finish_attempt(events);
                self.phase = CastPhase::Spent;
            }
            AdvanceOutcome::Exhausted => {
                info!("Cast aborted, no gesture left");
                events.push(CastEvent::Aborted);
                self.finish_attempt(events);
                self.phase = CastPhase::Failed;
            }
        }
    }

    /// Wipe matcher state, reporting a classification drop if one was shown.
    fn finish_attempt(&mut self, events: &mut Vec<CastEvent>) {
        self.matcher.reset();
        if self.classification != Classification::None {
            self.classification = Classification::None;
            events.push(CastEvent::ClassificationChanged(Classification::None));
        }
    }

    fn drain_matcher(&mut self, events: &mut Vec<CastEvent>) {
        events.extend(self.matcher.drain_events().into_iter().map(CastEvent::Gesture));
    }

    fn report_classification(&mut self, events: &mut Vec<CastEvent>) {
        let current = self.matcher.classification();
        if current != self.classification {
            debug!("Classification: {}", current.as_str());
            self.classification = current;
            events.push(CastEvent::ClassificationChanged(current));
        }
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        let hands = self
            .casting_mode()
            .map(|m| format!(":{}", m.as_str()))
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:enabled {} :phase :{} :hands {} :classification :{} :candidates {} :launching {})",
            if self.config.enabled { "t" } else { "nil" },
            self.phase.as_str(),
            hands,
            self.classification.as_str(),
            self.matcher.pending_count(),
            if self.launching { "t" } else { "nil" },
        )
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        self.config.to_sexp()
    }
}

// ── Tests ──────────────────────────────────────────────────
