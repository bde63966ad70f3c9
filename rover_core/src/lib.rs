#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core motion-control logic (hardware-agnostic).
//!
//! Everything with state, timing, or protocol semantics lives here. All
//! hardware interaction goes through `rover_traits::Drivetrain` and
//! `rover_traits::RangeSensor`; all timing goes through the injected clock.
//!
//! ## Architecture
//!
//! - **Command**: the `COMMAND,VALUE,UNIT` frame parser (`command` module)
//! - **Pilot**: the movement state machine: modes, distance targets,
//!   dead-reckoning estimate, turn deadlines (`pilot` module)
//! - **Ranging**: cadence-gated ultrasonic sampling with last-known
//!   retention (`ranging` module)
//! - **Report**: the ordered `key: value` status block, round-trippable
//!   (`report` module)
//! - **Arbiter**: startup-fixed command-source authority and the wireless
//!   short vocabulary (`arbiter` module)
//! - **Runner**: the single-threaded cooperative control loop (`runner`
//!   module)
//!
//! Distance is open-loop dead reckoning: elapsed time times a calibrated
//! speed constant. There are no encoders; calibration accuracy is the whole
//! story, and cumulative error on long or repeated moves is accepted.

pub mod arbiter;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod mocks;
pub mod pilot;
pub mod protocol;
pub mod ranging;
pub mod report;
pub mod runner;

pub use arbiter::{Arbiter, Authority, FrameSource, Inbound};
pub use command::{CONTINUOUS, Command, CommandName, parse_frame};
pub use config::{DriveCfg, RangingCfg, ReportCfg};
pub use error::{ParseError, Result, RoverError};
pub use pilot::{ModeKind, Notice, Pilot, Spin};
pub use ranging::{RangeMonitor, RangeSample};
pub use report::{Reporter, StatusReport};
pub use runner::{RunParams, run};
