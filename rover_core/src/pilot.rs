//! The movement-control state machine (`Pilot`).
//!
//! Owns the motion state: current mode, distance target, dead-reckoning
//! travel estimate, and the shared PWM duty. Commands mutate it through
//! `apply`; the control loop advances it through `tick`. All timing comes
//! from the injected clock so tests can drive it deterministically.
//!
//! Turns are modeled as their own mode carrying a deadline rather than a
//! blocking in-call sleep; the tick stops the drivetrain when the deadline
//! passes. The runner refuses to drain new frames while a turn is live, so
//! commands queue behind a turn exactly as they queued behind the original
//! blocking maneuver, and a turn always runs to completion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use rover_traits::{Clock, Drivetrain};

use crate::command::{Command, CommandName};
use crate::config::DriveCfg;
use crate::error::{Result, RoverError};

/// Externally visible mode label; `Display`/`FromStr` are part of the
/// status-block contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Stopped,
    Forward,
    Backward,
    Turning,
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stopped => "STOPPED",
            Self::Forward => "FORWARD",
            Self::Backward => "BACKWARD",
            Self::Turning => "TURNING",
        })
    }
}

impl std::str::FromStr for ModeKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "STOPPED" => Ok(Self::Stopped),
            "FORWARD" => Ok(Self::Forward),
            "BACKWARD" => Ok(Self::Backward),
            "TURNING" => Ok(Self::Turning),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Stopped,
    Forward,
    Backward,
    Turning { spin: Spin, until: Instant },
}

/// What a dispatched command or a tick did, for the protocol layer to echo.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Driving {
        mode: ModeKind,
        target_m: Option<f32>,
    },
    TurnStarted {
        spin: Spin,
        degrees: f32,
        duration_ms: u64,
    },
    TurnComplete,
    Stopped,
    SpeedChanged {
        pwm: u8,
        pct: f32,
    },
    StatusRequested,
    UnknownCommand {
        token: String,
    },
    TargetReached,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn hw_err(e: BoxError) -> eyre::Report {
    eyre::Report::new(RoverError::Hardware(e.to_string()))
}

/// Percentage → 8-bit duty. Non-finite input maps to 0; everything else is
/// clamped into [0, 255].
pub fn pct_to_pwm(pct: f32) -> u8 {
    if !pct.is_finite() {
        return 0;
    }
    (pct * 2.55).round().clamp(0.0, 255.0) as u8
}

/// Degrees → spin duration, linear over [0° → 0 ms, 360° → `full_turn_ms`],
/// degrees clamped to the mapping's domain.
pub fn turn_duration_ms(degrees: f32, full_turn_ms: u64) -> u64 {
    if !degrees.is_finite() {
        return 0;
    }
    let deg = degrees.clamp(0.0, 360.0);
    (f64::from(deg) / 360.0 * full_turn_ms as f64).round() as u64
}

pub struct Pilot<D: Drivetrain> {
    drive: D,
    clock: Arc<dyn Clock + Send + Sync>,
    cfg: DriveCfg,

    mode: Mode,
    /// 0.0 means no active target (stopped or continuous).
    target_m: f32,
    /// Present only while a distance-targeted move is underway.
    travel_epoch: Option<Instant>,
    traveled_m: f32,
    speed_pwm: u8,
}

impl<D: Drivetrain> std::fmt::Debug for Pilot<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pilot")
            .field("mode", &self.mode_kind())
            .field("target_m", &self.target_m)
            .field("traveled_m", &self.traveled_m)
            .field("speed_pwm", &self.speed_pwm)
            .finish()
    }
}

impl<D: Drivetrain> Pilot<D> {
    pub fn new(drive: D, cfg: DriveCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let speed_pwm = pct_to_pwm(cfg.default_speed_pct);
        Self {
            drive,
            clock,
            cfg,
            mode: Mode::Stopped,
            target_m: 0.0,
            travel_epoch: None,
            traveled_m: 0.0,
            speed_pwm,
        }
    }

    pub fn mode_kind(&self) -> ModeKind {
        match self.mode {
            Mode::Stopped => ModeKind::Stopped,
            Mode::Forward => ModeKind::Forward,
            Mode::Backward => ModeKind::Backward,
            Mode::Turning { .. } => ModeKind::Turning,
        }
    }

    pub fn speed_pwm(&self) -> u8 {
        self.speed_pwm
    }

    pub fn target_m(&self) -> f32 {
        self.target_m
    }

    pub fn traveled_m(&self) -> f32 {
        self.traveled_m
    }

    /// True while a turn maneuver is live; the runner defers new frames.
    pub fn is_turning(&self) -> bool {
        matches!(self.mode, Mode::Turning { .. })
    }

    /// Dispatch one parsed command. Returns the notices the protocol layer
    /// echoes back over serial.
    pub fn apply(&mut self, cmd: &Command) -> Result<Vec<Notice>> {
        match &cmd.name {
            CommandName::Forward => self.begin_move(ModeKind::Forward, cmd),
            CommandName::Backward => self.begin_move(ModeKind::Backward, cmd),
            CommandName::Left => self.begin_turn(Spin::Left, cmd.value),
            CommandName::Right => self.begin_turn(Spin::Right, cmd.value),
            CommandName::Stop => self.stop_now(),
            CommandName::Speed => self.set_speed(cmd.value),
            CommandName::Status => Ok(vec![Notice::StatusRequested]),
            CommandName::Unknown(token) => {
                tracing::warn!(token = %token, "unrecognized command, discarded");
                Ok(vec![Notice::UnknownCommand {
                    token: token.clone(),
                }])
            }
        }
    }

    /// One polling iteration: expire a turn deadline, or advance the
    /// dead-reckoning estimate and detect target completion.
    pub fn tick(&mut self) -> Result<Option<Notice>> {
        match self.mode {
            Mode::Turning { until, .. } => {
                if self.clock.now() >= until {
                    self.drive.stop().map_err(hw_err).wrap_err("stop after turn")?;
                    self.mode = Mode::Stopped;
                    tracing::debug!("turn complete");
                    return Ok(Some(Notice::TurnComplete));
                }
                Ok(None)
            }
            Mode::Forward | Mode::Backward => {
                let Some(epoch) = self.travel_epoch else {
                    // continuous move: no estimate, no auto-stop
                    return Ok(None);
                };
                self.traveled_m = self.clock.secs_since(epoch) * self.cfg.speed_m_per_s;
                if self.traveled_m >= self.target_m {
                    self.drive
                        .stop()
                        .map_err(hw_err)
                        .wrap_err("stop at target")?;
                    self.mode = Mode::Stopped;
                    self.target_m = 0.0;
                    self.travel_epoch = None;
                    tracing::info!(traveled_m = self.traveled_m, "target reached");
                    return Ok(Some(Notice::TargetReached));
                }
                Ok(None)
            }
            Mode::Stopped => Ok(None),
        }
    }

    /// Best-effort stop for shutdown paths; state is forced to Stopped even
    /// if the drivetrain errors.
    pub fn halt(&mut self) {
        if let Err(e) = self.drive.stop() {
            tracing::warn!(error = %e, "drivetrain stop failed on halt");
        }
        self.mode = Mode::Stopped;
        self.target_m = 0.0;
        self.travel_epoch = None;
    }

    fn begin_move(&mut self, heading: ModeKind, cmd: &Command) -> Result<Vec<Notice>> {
        let duty = self.speed_pwm;
        match heading {
            ModeKind::Forward => self
                .drive
                .forward(duty)
                .map_err(hw_err)
                .wrap_err("drive forward")?,
            ModeKind::Backward => self
                .drive
                .backward(duty)
                .map_err(hw_err)
                .wrap_err("drive backward")?,
            _ => unreachable!("begin_move only takes Forward/Backward"),
        }
        self.mode = match heading {
            ModeKind::Forward => Mode::Forward,
            _ => Mode::Backward,
        };
        self.traveled_m = 0.0;
        if cmd.is_continuous() {
            self.target_m = 0.0;
            self.travel_epoch = None;
            tracing::info!(mode = %heading, "continuous move started");
            Ok(vec![Notice::Driving {
                mode: heading,
                target_m: None,
            }])
        } else {
            // A degraded or explicit 0 still counts as a (zero-distance)
            // target; the next tick completes it immediately.
            self.target_m = cmd.value.max(0.0);
            self.travel_epoch = Some(self.clock.now());
            tracing::info!(mode = %heading, target_m = self.target_m, "targeted move started");
            Ok(vec![Notice::Driving {
                mode: heading,
                target_m: Some(self.target_m),
            }])
        }
    }

    fn begin_turn(&mut self, spin: Spin, degrees: f32) -> Result<Vec<Notice>> {
        let duration_ms = turn_duration_ms(degrees, self.cfg.full_turn_ms);
        let duty = self.speed_pwm;
        match spin {
            Spin::Left => self
                .drive
                .turn_left(duty)
                .map_err(hw_err)
                .wrap_err("turn left")?,
            Spin::Right => self
                .drive
                .turn_right(duty)
                .map_err(hw_err)
                .wrap_err("turn right")?,
        }
        self.mode = Mode::Turning {
            spin,
            until: self.clock.now() + Duration::from_millis(duration_ms),
        };
        self.target_m = 0.0;
        self.travel_epoch = None;
        tracing::info!(?spin, degrees, duration_ms, "turn started");
        Ok(vec![Notice::TurnStarted {
            spin,
            degrees,
            duration_ms,
        }])
    }

    fn stop_now(&mut self) -> Result<Vec<Notice>> {
        self.drive.stop().map_err(hw_err).wrap_err("drive stop")?;
        self.mode = Mode::Stopped;
        self.target_m = 0.0;
        self.travel_epoch = None;
        tracing::info!("stopped");
        Ok(vec![Notice::Stopped])
    }

    fn set_speed(&mut self, pct: f32) -> Result<Vec<Notice>> {
        self.speed_pwm = pct_to_pwm(pct);
        let duty = self.speed_pwm;
        // Re-drive the live primitive so the new duty applies now rather
        // than on the next actuation.
        match self.mode {
            Mode::Forward => self
                .drive
                .forward(duty)
                .map_err(hw_err)
                .wrap_err("re-apply duty")?,
            Mode::Backward => self
                .drive
                .backward(duty)
                .map_err(hw_err)
                .wrap_err("re-apply duty")?,
            Mode::Turning { spin, .. } => match spin {
                Spin::Left => self
                    .drive
                    .turn_left(duty)
                    .map_err(hw_err)
                    .wrap_err("re-apply duty")?,
                Spin::Right => self
                    .drive
                    .turn_right(duty)
                    .map_err(hw_err)
                    .wrap_err("re-apply duty")?,
            },
            Mode::Stopped => {}
        }
        let pct_effective = f32::from(duty) / 2.55;
        tracing::info!(pwm = duty, "speed set");
        Ok(vec![Notice::SpeedChanged {
            pwm: duty,
            pct: pct_effective,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_to_pwm_clamps_and_rounds() {
        assert_eq!(pct_to_pwm(0.0), 0);
        assert_eq!(pct_to_pwm(100.0), 255);
        assert_eq!(pct_to_pwm(150.0), 255);
        assert_eq!(pct_to_pwm(-5.0), 0);
        assert_eq!(pct_to_pwm(75.0), 191);
        assert_eq!(pct_to_pwm(f32::NAN), 0);
    }

    #[test]
    fn turn_duration_is_linear_and_clamped() {
        assert_eq!(turn_duration_ms(360.0, 2000), 2000);
        assert_eq!(turn_duration_ms(180.0, 2000), 1000);
        assert_eq!(turn_duration_ms(90.0, 2000), 500);
        assert_eq!(turn_duration_ms(0.0, 2000), 0);
        assert_eq!(turn_duration_ms(720.0, 2000), 2000);
        assert_eq!(turn_duration_ms(-90.0, 2000), 0);
        assert_eq!(turn_duration_ms(f32::NAN, 2000), 0);
    }

    #[test]
    fn mode_kind_round_trips_through_str() {
        for kind in [
            ModeKind::Stopped,
            ModeKind::Forward,
            ModeKind::Backward,
            ModeKind::Turning,
        ] {
            let s = kind.to_string();
            assert_eq!(s.parse::<ModeKind>().unwrap(), kind);
        }
    }
}
