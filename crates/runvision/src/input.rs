//! Operator input: key presses and pointer events, drained once per cycle.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Pointer coordinates are in display space (frame pixels times the
/// display scale).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Key { key: char },
    Escape,
    Move { x: i32, y: i32 },
    Click { x: i32, y: i32 },
}

/// What the control loop does with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
    ForceStop,
}

/// What a calibration phase does with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationCommand {
    Move { x: i32, y: i32 },
    Click { x: i32, y: i32 },
    ResetRange,
    Finish,
    Quit,
}

impl InputEvent {
    /// Main-loop key map: `q` quit, `r` restart, `s` force stop.
    pub fn command(&self) -> Option<Command> {
        match self {
            InputEvent::Key { key: 'q' } => Some(Command::Quit),
            InputEvent::Key { key: 'r' } => Some(Command::Restart),
            InputEvent::Key { key: 's' } => Some(Command::ForceStop),
            _ => None,
        }
    }

    /// Calibration key map: `Esc`/`f` finish, `r` reset, `q` quit.
    pub fn calibration_command(&self) -> Option<CalibrationCommand> {
        match *self {
            InputEvent::Move { x, y } => Some(CalibrationCommand::Move { x, y }),
            InputEvent::Click { x, y } => Some(CalibrationCommand::Click { x, y }),
            InputEvent::Escape | InputEvent::Key { key: 'f' } => Some(CalibrationCommand::Finish),
            InputEvent::Key { key: 'r' } => Some(CalibrationCommand::ResetRange),
            InputEvent::Key { key: 'q' } => Some(CalibrationCommand::Quit),
            InputEvent::Key { .. } => None,
        }
    }
}

/// Bounded, non-blocking-ish input poll.
pub trait InputSource {
    /// Wait at most `timeout` and return every event that arrived.
    fn poll(&mut self, timeout: Duration) -> Vec<InputEvent>;

    /// True once no further events can ever arrive.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn poll(&mut self, timeout: Duration) -> Vec<InputEvent> {
        (**self).poll(timeout)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn poll(&mut self, timeout: Duration) -> Vec<InputEvent> {
        (**self).poll(timeout)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// No operator attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _timeout: Duration) -> Vec<InputEvent> {
        Vec::new()
    }

    fn is_closed(&self) -> bool {
        true
    }
}

/// One scripted event delivered on poll number `at` (counted from zero).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at: u64,
    pub event: InputEvent,
}

/// Replays a fixed event script, one poll per cycle.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<ScriptedEvent>,
    polls: u64,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<ScriptedEvent>) -> Self {
        events.sort_by_key(|e| e.at);
        Self {
            events: events.into(),
            polls: 0,
        }
    }

    /// Load a JSON array of `{"at": n, "event": {...}}` entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let events: Vec<ScriptedEvent> =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(events))
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _timeout: Duration) -> Vec<InputEvent> {
        let mut out = Vec::new();
        while let Some(next) = self.events.front() {
            if next.at > self.polls {
                break;
            }
            out.push(next.event);
            self.events.pop_front();
        }
        self.polls += 1;
        out
    }

    fn is_closed(&self) -> bool {
        self.events.is_empty()
    }
}

/// Reads operator commands from stdin on a helper thread.
///
/// Each line is either a list of key characters (`q`, `r`, `f`...), the word
/// `esc`, or `click X Y` / `move X Y`.
pub struct StdinInput {
    rx: Receiver<InputEvent>,
    closed: bool,
}

impl StdinInput {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for event in parse_line(&line) {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });
        Self { rx, closed: false }
    }
}

impl InputSource for StdinInput {
    fn poll(&mut self, timeout: Duration) -> Vec<InputEvent> {
        let mut out = Vec::new();
        if self.closed {
            return out;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => out.push(ev),
            Err(RecvTimeoutError::Timeout) => return out,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                return out;
            }
        }
        loop {
            match self.rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        out
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Parse one line of operator input.
pub fn parse_line(line: &str) -> Vec<InputEvent> {
    let mut words = line.split_whitespace();
    match words.next() {
        None => Vec::new(),
        Some("esc") => vec![InputEvent::Escape],
        Some(kind @ ("click" | "move")) => {
            let coords: Vec<i32> = words.filter_map(|w| w.parse().ok()).collect();
            match (kind, coords.as_slice()) {
                ("click", [x, y]) => vec![InputEvent::Click { x: *x, y: *y }],
                ("move", [x, y]) => vec![InputEvent::Move { x: *x, y: *y }],
                _ => {
                    log::warn!("ignoring malformed input line {line:?}");
                    Vec::new()
                }
            }
        }
        Some(_) => line
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|key| InputEvent::Key { key })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_events_arrive_on_their_poll() {
        let mut input = ScriptedInput::new(vec![
            ScriptedEvent {
                at: 2,
                event: InputEvent::Key { key: 'q' },
            },
            ScriptedEvent {
                at: 0,
                event: InputEvent::Click { x: 5, y: 6 },
            },
            ScriptedEvent {
                at: 0,
                event: InputEvent::Escape,
            },
        ]);
        let t = Duration::from_millis(20);
        assert_eq!(
            input.poll(t),
            vec![InputEvent::Click { x: 5, y: 6 }, InputEvent::Escape]
        );
        assert!(input.poll(t).is_empty());
        assert!(!input.is_closed());
        assert_eq!(input.poll(t), vec![InputEvent::Key { key: 'q' }]);
        assert!(input.is_closed());
    }

    #[test]
    fn script_json_format() {
        let json = r#"[{"at": 1, "event": {"type": "click", "x": 10, "y": 20}},
                       {"at": 3, "event": {"type": "key", "key": "f"}},
                       {"at": 4, "event": {"type": "escape"}}]"#;
        let events: Vec<ScriptedEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].event, InputEvent::Click { x: 10, y: 20 });
        assert_eq!(
            events[1].event.calibration_command(),
            Some(CalibrationCommand::Finish)
        );
        assert_eq!(
            events[2].event.calibration_command(),
            Some(CalibrationCommand::Finish)
        );
    }

    #[test]
    fn key_maps() {
        assert_eq!(InputEvent::Key { key: 'q' }.command(), Some(Command::Quit));
        assert_eq!(InputEvent::Key { key: 'r' }.command(), Some(Command::Restart));
        assert_eq!(InputEvent::Key { key: 's' }.command(), Some(Command::ForceStop));
        assert_eq!(InputEvent::Escape.command(), None);
        assert_eq!(
            InputEvent::Key { key: 'r' }.calibration_command(),
            Some(CalibrationCommand::ResetRange)
        );
        assert_eq!(InputEvent::Key { key: 'x' }.calibration_command(), None);
    }

    #[test]
    fn parses_operator_lines() {
        assert_eq!(parse_line("click 12 34"), vec![InputEvent::Click { x: 12, y: 34 }]);
        assert_eq!(parse_line("move 1 2"), vec![InputEvent::Move { x: 1, y: 2 }]);
        assert_eq!(parse_line("esc"), vec![InputEvent::Escape]);
        assert_eq!(
            parse_line("rq"),
            vec![InputEvent::Key { key: 'r' }, InputEvent::Key { key: 'q' }]
        );
        assert!(parse_line("click 1").is_empty());
        assert!(parse_line("   ").is_empty());
    }
}
