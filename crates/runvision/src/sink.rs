//! Actuator and head sinks.
//!
//! The motion controller reads the latest command from a blackboard under
//! four fixed keys. Here the blackboard is either a JSON-lines stream (one
//! object per cycle) or an in-memory history.

use crate::error::SinkError;
use runvision_nav::{ActuatorCommand, HeadCommand};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const KEY_ACTION: &str = "DECISION_ACTION_A";
pub const KEY_FORWARD: &str = "VISION_OPP01_DIST";
pub const KEY_LATERAL: &str = "VISION_OPP02_DIST";
pub const KEY_TURNING: &str = "VISION_OPP03_DIST";

/// Receives one command per cycle. Each publish supersedes the previous one.
pub trait ActuatorSink {
    fn publish(&mut self, command: &ActuatorCommand) -> Result<(), SinkError>;
}

/// Head/camera pointing servo.
pub trait HeadActuator {
    fn set_position(&mut self, command: &HeadCommand) -> Result<(), SinkError>;
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for &mut T {
    fn publish(&mut self, command: &ActuatorCommand) -> Result<(), SinkError> {
        (**self).publish(command)
    }
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for Box<T> {
    fn publish(&mut self, command: &ActuatorCommand) -> Result<(), SinkError> {
        (**self).publish(command)
    }
}

impl<T: HeadActuator + ?Sized> HeadActuator for &mut T {
    fn set_position(&mut self, command: &HeadCommand) -> Result<(), SinkError> {
        (**self).set_position(command)
    }
}

impl<T: HeadActuator + ?Sized> HeadActuator for Box<T> {
    fn set_position(&mut self, command: &HeadCommand) -> Result<(), SinkError> {
        (**self).set_position(command)
    }
}

/// Blackboard entry as written for the motion controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlackboardRecord {
    #[serde(rename = "DECISION_ACTION_A")]
    pub action: i32,
    #[serde(rename = "VISION_OPP01_DIST")]
    pub forward: f32,
    #[serde(rename = "VISION_OPP02_DIST")]
    pub lateral: f32,
    #[serde(rename = "VISION_OPP03_DIST")]
    pub turning: f32,
}

impl From<&ActuatorCommand> for BlackboardRecord {
    fn from(c: &ActuatorCommand) -> Self {
        Self {
            action: c.action,
            forward: c.forward,
            lateral: c.lateral,
            turning: c.turning,
        }
    }
}

impl From<BlackboardRecord> for ActuatorCommand {
    fn from(r: BlackboardRecord) -> Self {
        Self {
            action: r.action,
            forward: r.forward,
            lateral: r.lateral,
            turning: r.turning,
        }
    }
}

/// Writes one JSON object per publish and flushes immediately.
pub struct JsonLinesBlackboard<W: Write> {
    writer: W,
    written: u64,
}

impl JsonLinesBlackboard<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesBlackboard<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ActuatorSink for JsonLinesBlackboard<W> {
    fn publish(&mut self, command: &ActuatorCommand) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &BlackboardRecord::from(command))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}

/// Keeps every published command; handy for tests and dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlackboard {
    pub published: Vec<ActuatorCommand>,
}

impl MemoryBlackboard {
    pub fn latest(&self) -> Option<&ActuatorCommand> {
        self.published.last()
    }
}

impl ActuatorSink for MemoryBlackboard {
    fn publish(&mut self, command: &ActuatorCommand) -> Result<(), SinkError> {
        self.published.push(*command);
        Ok(())
    }
}

/// Head actuator that only logs the requested positions.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHead;

impl HeadActuator for LogHead {
    fn set_position(&mut self, command: &HeadCommand) -> Result<(), SinkError> {
        log::info!(
            "head: channel={} speed={} position={}",
            command.channel,
            command.speed,
            command.position
        );
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecordingHead {
    pub positions: Vec<HeadCommand>,
}

impl HeadActuator for RecordingHead {
    fn set_position(&mut self, command: &HeadCommand) -> Result<(), SinkError> {
        self.positions.push(*command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_use_blackboard_keys() {
        let mut bb = JsonLinesBlackboard::new(Vec::new());
        bb.publish(&ActuatorCommand {
            action: 21,
            forward: -19.0,
            lateral: 0.0,
            turning: 7.5,
        })
        .unwrap();
        bb.publish(&ActuatorCommand::action(0)).unwrap();
        assert_eq!(bb.written(), 2);

        let text = String::from_utf8(bb.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v[KEY_ACTION], 21);
        assert_eq!(v[KEY_FORWARD], -19.0);
        assert_eq!(v[KEY_LATERAL], 0.0);
        assert_eq!(v[KEY_TURNING], 7.5);

        let rec: BlackboardRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(ActuatorCommand::from(rec), ActuatorCommand::action(0));
    }

    #[test]
    fn boxed_sinks_forward() {
        let mut mem = MemoryBlackboard::default();
        {
            let mut boxed: Box<dyn ActuatorSink + '_> = Box::new(&mut mem);
            boxed.publish(&ActuatorCommand::action(5)).unwrap();
        }
        assert_eq!(mem.latest().map(|c| c.action), Some(5));
    }
}
