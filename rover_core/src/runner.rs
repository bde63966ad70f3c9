//! The cooperative control loop.
//!
//! One thread, one loop. Each iteration drains at most one frame (unless a
//! turn is live, in which case frames wait in the transport buffer), runs
//! the pilot's polling tick, gives the ranging monitor its cadence slot,
//! emits a status block when due or requested, then sleeps one period.
//! Shared state never crosses a thread boundary; there is nothing to lock.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rover_traits::{Clock, Drivetrain, RangeSensor};

use crate::arbiter::{Arbiter, FrameSource, Inbound};
use crate::command::Command;
use crate::error::Result;
use crate::pilot::{Notice, Pilot, Spin};
use crate::protocol;
use crate::ranging::RangeMonitor;
use crate::report::{Reporter, StatusReport};

pub struct RunParams {
    pub loop_period: Duration,
    pub dry_run: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            loop_period: Duration::from_millis(20),
            dry_run: false,
        }
    }
}

/// Write one protocol line; telemetry write failures are logged and
/// tolerated, never fatal to the control loop.
fn emit<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = writeln!(out, "{line}") {
        tracing::warn!(error = %e, "serial write failed");
    }
}

fn render_notice(notice: &Notice) -> Option<String> {
    match notice {
        Notice::Driving { mode, target_m } => Some(match target_m {
            Some(t) => format!("drive: {mode} target {t:.2} m"),
            None => format!("drive: {mode} continuous"),
        }),
        Notice::TurnStarted {
            spin,
            degrees,
            duration_ms,
        } => {
            let dir = match spin {
                Spin::Left => "left",
                Spin::Right => "right",
            };
            Some(format!("turn: {dir} {degrees} deg for {duration_ms} ms"))
        }
        Notice::TurnComplete => Some("turn complete".to_string()),
        Notice::Stopped => Some("stopped".to_string()),
        Notice::SpeedChanged { pwm, pct } => Some(format!("speed: {pwm}/255 ({pct:.0}%)")),
        Notice::UnknownCommand { token } => Some(protocol::unknown_line(token)),
        Notice::TargetReached => Some(protocol::TARGET_REACHED.to_string()),
        Notice::StatusRequested => None,
    }
}

/// Run until the shutdown flag is raised. Hardware failures propagate after
/// a best-effort motor stop; protocol-level errors never end the loop.
#[allow(clippy::too_many_arguments)]
pub fn run<D, R, S, W>(
    mut pilot: Pilot<D>,
    mut ranging: RangeMonitor<R>,
    mut reporter: Reporter,
    mut arbiter: Arbiter<S>,
    mut out: W,
    shutdown: Arc<AtomicBool>,
    clock: Arc<dyn Clock + Send + Sync>,
    params: RunParams,
) -> Result<()>
where
    D: Drivetrain,
    R: RangeSensor,
    S: FrameSource,
    W: Write,
{
    for line in protocol::banner() {
        emit(&mut out, &line);
    }
    emit(&mut out, protocol::READY);
    tracing::info!(authority = ?arbiter.authority(), dry_run = params.dry_run, "control loop started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            pilot.halt();
            tracing::info!("shutdown requested, drivetrain stopped");
            return Ok(());
        }

        // (a) at most one new frame, unless a turn maneuver holds the floor
        let mut want_status = false;
        if !pilot.is_turning() {
            match arbiter.poll() {
                Ok(Some(Inbound::Frame(cmd))) => {
                    want_status |= dispatch(&mut pilot, &cmd, &mut out).inspect_err(|_| {
                        pilot.halt();
                    })?;
                }
                Ok(Some(Inbound::Malformed)) => {
                    emit(&mut out, &protocol::malformed_line());
                }
                Ok(None) => {}
                Err(e) => {
                    pilot.halt();
                    return Err(e);
                }
            }
        }

        // (b) pilot polling tick: turn deadlines and dead-reckoning targets
        match pilot.tick() {
            Ok(Some(notice)) => {
                if let Some(line) = render_notice(&notice) {
                    emit(&mut out, &line);
                }
            }
            Ok(None) => {}
            Err(e) => {
                pilot.halt();
                return Err(e);
            }
        }

        // (c) cadence-gated ranging
        ranging.poll();

        // (d) cadence-gated or requested status
        if want_status || reporter.due_now() {
            let report = StatusReport {
                mode: pilot.mode_kind(),
                speed_pwm: pilot.speed_pwm(),
                range_cm: ranging.last_cm(),
                target_m: pilot.target_m(),
                traveled_m: pilot.traveled_m(),
                dry_run: params.dry_run,
                uptime_s: reporter.uptime_s(),
            };
            emit(&mut out, &report.to_string());
        }

        clock.sleep(params.loop_period);
    }
}

/// Echo, apply, trace, acknowledge. Returns whether a status block was
/// requested.
fn dispatch<D: Drivetrain, W: Write>(
    pilot: &mut Pilot<D>,
    cmd: &Command,
    out: &mut W,
) -> Result<bool> {
    emit(out, &protocol::echo_line(cmd));
    let notices = pilot.apply(cmd)?;
    let mut want_status = false;
    for notice in &notices {
        if matches!(notice, Notice::StatusRequested) {
            want_status = true;
        }
        if let Some(line) = render_notice(notice) {
            emit(out, &line);
        }
    }
    emit(out, protocol::ACK);
    Ok(want_status)
}
