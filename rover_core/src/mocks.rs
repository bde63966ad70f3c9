//! Test and helper mocks: a recording drivetrain, a scripted range sensor,
//! a queue-backed frame source, and a manually advanced clock.
//!
//! Compiled unconditionally so sibling crates' test suites can use them.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rover_traits::{Clock, Drivetrain, RangeSensor};

use crate::arbiter::FrameSource;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveAction {
    Forward(u8),
    Backward(u8),
    TurnLeft(u8),
    TurnRight(u8),
    Stop,
}

/// Drivetrain that records every primitive call for assertions.
#[derive(Default)]
pub struct RecordingDrivetrain {
    log: Arc<Mutex<Vec<DriveAction>>>,
}

impl RecordingDrivetrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the action log; clone before moving the drivetrain
    /// into a `Pilot`.
    pub fn log(&self) -> Arc<Mutex<Vec<DriveAction>>> {
        Arc::clone(&self.log)
    }

    fn push(&self, action: DriveAction) {
        if let Ok(mut log) = self.log.lock() {
            log.push(action);
        }
    }
}

impl Drivetrain for RecordingDrivetrain {
    fn forward(&mut self, duty: u8) -> Result<(), BoxError> {
        self.push(DriveAction::Forward(duty));
        Ok(())
    }
    fn backward(&mut self, duty: u8) -> Result<(), BoxError> {
        self.push(DriveAction::Backward(duty));
        Ok(())
    }
    fn turn_left(&mut self, duty: u8) -> Result<(), BoxError> {
        self.push(DriveAction::TurnLeft(duty));
        Ok(())
    }
    fn turn_right(&mut self, duty: u8) -> Result<(), BoxError> {
        self.push(DriveAction::TurnRight(duty));
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        self.push(DriveAction::Stop);
        Ok(())
    }
}

/// Range sensor that replays a fixed script; `None` entries simulate echo
/// timeouts, and an exhausted script keeps timing out.
#[derive(Default)]
pub struct ScriptedRangeSensor {
    readings: VecDeque<Option<f32>>,
}

impl ScriptedRangeSensor {
    pub fn new(readings: impl IntoIterator<Item = Option<f32>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }
}

impl RangeSensor for ScriptedRangeSensor {
    fn measure(&mut self, _timeout: Duration) -> Result<Option<f32>, BoxError> {
        Ok(self.readings.pop_front().flatten())
    }
}

/// Frame source backed by a queue of pre-loaded lines.
#[derive(Default)]
pub struct QueueSource {
    lines: VecDeque<String>,
}

impl QueueSource {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FrameSource for QueueSource {
    fn poll_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Deterministic clock whose time advances only when told to (or when
/// something sleeps on it).
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
