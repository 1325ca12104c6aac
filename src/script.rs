//! Frame scripts: recorded hand input replayed through a casting session.
//!
//! One s-expression plist per line, blank lines and `;` comments skipped:
//!
//! ```text
//! (:type :begin-cast :hand :right)
//! (:type :frame :dt 0.016 :right (x y z pitch yaw roll) :left (...) :head-yaw 0)
//! (:type :end-cast :hand :right)
//! ```
//!
//! A frame that omits a hand or the head keeps its previous pose.

use anyhow::{anyhow, bail, Context};
use lexpr::Value;

use crate::casting::{CastingSession, Hand, HandPose, Rotator, TrackingFrame, Vec3};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginCast(Hand),
    EndCast(Hand),
    BeginLaunch(Hand),
    EndLaunch(Hand),
    Cancel,
    Status,
    Frame(FrameUpdate),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameUpdate {
    pub dt: f32,
    pub right: Option<HandPose>,
    pub left: Option<HandPose>,
    pub head_yaw: Option<f32>,
}

/// Parse a single line.  `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return Ok(None);
    }
    let value = lexpr::from_str(trimmed).map_err(|e| anyhow!("malformed s-expression: {e}"))?;
    let msg_type = get_keyword(&value, "type").ok_or_else(|| anyhow!("missing :type"))?;

    let command = match msg_type.as_str() {
        "begin-cast" => Command::BeginCast(get_hand(&value)?),
        "end-cast" => Command::EndCast(get_hand(&value)?),
        "begin-launch" => Command::BeginLaunch(get_hand(&value)?),
        "end-launch" => Command::EndLaunch(get_hand(&value)?),
        "cancel" => Command::Cancel,
        "status" => Command::Status,
        "frame" => Command::Frame(FrameUpdate {
            dt: get_float(&value, "dt").ok_or_else(|| anyhow!("frame needs :dt"))? as f32,
            right: get_pose(&value, "right")?,
            left: get_pose(&value, "left")?,
            head_yaw: get_float(&value, "head-yaw").map(|y| y as f32),
        }),
        other => bail!("unknown command type '{other}'"),
    };
    Ok(Some(command))
}

/// Parse a whole script, reporting the first bad line by number.
pub fn parse_script(text: &str) -> anyhow::Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if let Some(cmd) = parse_line(line).with_context(|| format!("line {}", n + 1))? {
            commands.push(cmd);
        }
    }
    Ok(commands)
}

// ── Replay ─────────────────────────────────────────────────

/// Feeds commands to a session, tracking the last known poses.
pub struct Replay {
    session: CastingSession,
    frame: TrackingFrame,
}

impl Replay {
    pub fn new(session: CastingSession) -> Self {
        Self {
            session,
            frame: TrackingFrame::default(),
        }
    }

    pub fn session(&self) -> &CastingSession {
        &self.session
    }

    /// Apply one command; returns the output lines it produced.
    pub fn apply(&mut self, command: &Command) -> Vec<String> {
        let events = match command {
            Command::BeginCast(hand) => self.session.begin_cast(*hand),
            Command::EndCast(hand) => self.session.end_cast(*hand),
            Command::BeginLaunch(hand) => {
                self.session.begin_launch(*hand);
                Vec::new()
            }
            Command::EndLaunch(hand) => {
                self.session.end_launch(*hand);
                Vec::new()
            }
            Command::Cancel => self.session.cancel(),
            Command::Status => return vec![self.session.status_sexp()],
            Command::Frame(update) => {
                if let Some(pose) = update.right {
                    self.frame.right = pose;
                }
                if let Some(pose) = update.left {
                    self.frame.left = pose;
                }
                if let Some(yaw) = update.head_yaw {
                    self.frame.head.rotation.yaw = yaw;
                }
                self.session.update(&self.frame, update.dt)
            }
        };
        events.iter().map(|e| e.to_sexp()).collect()
    }
}

// ── Plist helpers ──────────────────────────────────────────

/// Find the value following `:key` in a plist.
/// Handles both `Value::Keyword("key")` and `Value::Symbol(":key")`.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Keyword or symbol value as a bare string, without the leading colon.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    match get_value(value, key)? {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => {
            let s: &str = v;
            Some(s.strip_prefix(':').unwrap_or(s).to_string())
        }
        Value::String(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_value(value, key).and_then(Value::as_f64)
}

fn get_hand(value: &Value) -> anyhow::Result<Hand> {
    let name = get_keyword(value, "hand").ok_or_else(|| anyhow!("missing :hand"))?;
    Hand::from_str(&name).ok_or_else(|| anyhow!("unknown hand '{name}'"))
}

/// `(x y z pitch yaw roll)` under `key`, if present.
fn get_pose(value: &Value, key: &str) -> anyhow::Result<Option<HandPose>> {
    let Some(list) = get_value(value, key) else {
        return Ok(None);
    };
    let numbers = list
        .list_iter()
        .ok_or_else(|| anyhow!(":{key} must be a list"))?
        .map(|v| v.as_f64().map(|n| n as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| anyhow!(":{key} must contain only numbers"))?;
    if numbers.len() != 6 {
        bail!(":{key} needs 6 numbers (x y z pitch yaw roll), got {}", numbers.len());
    }
    Ok(Some(HandPose::new(
        Vec3::new(numbers[0], numbers[1], numbers[2]),
        Rotator::new(numbers[3], numbers[4], numbers[5]),
    )))
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::casting::{CastingConfig, GestureLibrary};

    #[test]
    fn test_parse_hand_commands() {
        assert_eq!(
            parse_line("(:type :begin-cast :hand :right)").unwrap(),
            Some(Command::BeginCast(Hand::Right))
        );
        assert_eq!(
            parse_line("(:type :end-launch :hand :left)").unwrap(),
            Some(Command::EndLaunch(Hand::Left))
        );
        assert_eq!(parse_line("(:type :cancel)").unwrap(), Some(Command::Cancel));
    }

    #[test]
    fn test_parse_frame() {
        let cmd = parse_line("(:type :frame :dt 0.5 :right (1 2 3 0 90 -45) :head-yaw 30)")
            .unwrap()
            .unwrap();
        let Command::Frame(update) = cmd else {
            panic!("Expected frame, got {:?}", cmd);
        };
        assert_eq!(update.dt, 0.5);
        assert_eq!(
            update.right,
            Some(HandPose::new(Vec3::new(1.0, 2.0, 3.0), Rotator::new(0.0, 90.0, -45.0)))
        );
        assert_eq!(update.left, None);
        assert_eq!(update.head_yaw, Some(30.0));
    }

    #[test]
    fn test_skips_blank_and_comments() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("; right hand only").unwrap(), None);
    }

    #[test]
    fn test_errors() {
        assert!(parse_line("(:type :wave)").is_err());
        assert!(parse_line("(:type :begin-cast)").is_err());
        assert!(parse_line("(:type :begin-cast :hand :middle)").is_err());
        assert!(parse_line("(:type :frame :dt 0.1 :right (1 2 3))").is_err());
        assert!(parse_line("(:type :frame :right (0 0 0 0 0 0))").is_err());
        assert!(parse_line("(:type :frame").is_err());
    }

    #[test]
    fn test_error_carries_line_number() {
        let err = parse_script("(:type :cancel)\n\n(:type :bogus)\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3");
        assert!(format!("{:#}", err).contains("unknown command type 'bogus'"));
    }

    #[test]
    fn test_replay_beam() {
        let mut script = String::from("(:type :begin-cast :hand :right)\n");
        for _ in 0..4 {
            script.push_str("(:type :frame :dt 0.0625 :right (0 20 0 0 0 0) :left (0 -20 0 0 0 0))\n");
        }
        script.push_str("(:type :frame :dt 0.0625 :right (2 20 0 0 0 -20))\n");
        script.push_str("(:type :frame :dt 0.0625 :right (4 20 0 0 0 -50))\n");
        script.push_str("(:type :frame :dt 0.0625 :right (6 20 0 0 0 -80))\n");
        script.push_str("(:type :end-cast :hand :right)\n");

        let session = CastingSession::new(
            Arc::new(GestureLibrary::builtin().unwrap()),
            CastingConfig::default(),
        );
        let mut replay = Replay::new(session);
        let output: Vec<String> = parse_script(&script)
            .unwrap()
            .iter()
            .flat_map(|c| replay.apply(c))
            .collect();

        assert!(output.iter().any(|l| l.starts_with("(:type :event :event :cast-started :hands :right")));
        assert!(output.contains(
            &"(:type :event :event :cast-completed :spell :beam :category :base :hands :right)".to_string()
        ));
        for line in &output {
            assert!(lexpr::from_str(line).is_ok(), "unparseable output {}", line);
        }
    }
}
