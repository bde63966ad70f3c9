//! Status telemetry block: a fixed, ordered set of `key: value` lines
//! between two sentinel lines.
//!
//! Field order and presence are part of the host contract. `StatusReport`
//! round-trips through its text form so the host (and our tests) can parse
//! what the rover emits.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rover_traits::Clock;

use crate::config::ReportCfg;
use crate::pilot::ModeKind;
use crate::protocol::{STATUS_BEGIN, STATUS_END};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub mode: ModeKind,
    pub speed_pwm: u8,
    pub range_cm: Option<f32>,
    pub target_m: f32,
    pub traveled_m: f32,
    pub dry_run: bool,
    pub uptime_s: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{STATUS_BEGIN}")?;
        writeln!(f, "mode: {}", self.mode)?;
        writeln!(f, "speed_pwm: {}", self.speed_pwm)?;
        writeln!(f, "speed_pct: {:.0}", f32::from(self.speed_pwm) / 2.55)?;
        match self.range_cm {
            Some(cm) => writeln!(f, "range_cm: {cm:.1}")?,
            None => writeln!(f, "range_cm: none")?,
        }
        writeln!(f, "target_m: {:.2}", self.target_m)?;
        writeln!(f, "traveled_m: {:.2}", self.traveled_m)?;
        writeln!(
            f,
            "actuation: {}",
            if self.dry_run { "dry-run" } else { "live" }
        )?;
        writeln!(f, "uptime_s: {}", self.uptime_s)?;
        write!(f, "{STATUS_END}")
    }
}

impl FromStr for StatusReport {
    type Err = String;

    fn from_str(block: &str) -> Result<Self, Self::Err> {
        let mut mode = None;
        let mut speed_pwm = None;
        let mut range_cm = None;
        let mut target_m = None;
        let mut traveled_m = None;
        let mut dry_run = None;
        let mut uptime_s = None;

        for line in block.lines() {
            let line = line.trim();
            if line.is_empty() || line == STATUS_BEGIN || line == STATUS_END {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(format!("not a key: value line: '{line}'"));
            };
            let value = value.trim();
            match key.trim() {
                "mode" => mode = Some(value.parse::<ModeKind>()?),
                "speed_pwm" => {
                    speed_pwm = Some(value.parse::<u8>().map_err(|e| e.to_string())?);
                }
                "speed_pct" => {} // derived; re-derived from speed_pwm
                "range_cm" => {
                    range_cm = if value == "none" {
                        Some(None)
                    } else {
                        Some(Some(value.parse::<f32>().map_err(|e| e.to_string())?))
                    };
                }
                "target_m" => {
                    target_m = Some(value.parse::<f32>().map_err(|e| e.to_string())?);
                }
                "traveled_m" => {
                    traveled_m = Some(value.parse::<f32>().map_err(|e| e.to_string())?);
                }
                "actuation" => {
                    dry_run = Some(match value {
                        "dry-run" => true,
                        "live" => false,
                        other => return Err(format!("unknown actuation '{other}'")),
                    });
                }
                "uptime_s" => {
                    uptime_s = Some(value.parse::<u64>().map_err(|e| e.to_string())?);
                }
                other => return Err(format!("unknown status field '{other}'")),
            }
        }

        Ok(Self {
            mode: mode.ok_or("missing mode")?,
            speed_pwm: speed_pwm.ok_or("missing speed_pwm")?,
            range_cm: range_cm.ok_or("missing range_cm")?,
            target_m: target_m.ok_or("missing target_m")?,
            traveled_m: traveled_m.ok_or("missing traveled_m")?,
            dry_run: dry_run.ok_or("missing actuation")?,
            uptime_s: uptime_s.ok_or("missing uptime_s")?,
        })
    }
}

/// Cadence and uptime keeper for unsolicited status blocks.
pub struct Reporter {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    period: Option<Duration>,
    next_due: Option<Instant>,
}

impl Reporter {
    pub fn new(cfg: &ReportCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        let period = (cfg.period_s > 0).then(|| Duration::from_secs(cfg.period_s));
        Self {
            clock,
            epoch,
            period,
            next_due: None,
        }
    }

    /// True when the periodic cadence has elapsed; advances the deadline.
    pub fn due_now(&mut self) -> bool {
        let Some(period) = self.period else {
            return false;
        };
        let now = self.clock.now();
        match self.next_due {
            None => {
                self.next_due = Some(now + period);
                false
            }
            Some(due) if now >= due => {
                self.next_due = Some(now + period);
                true
            }
            Some(_) => false,
        }
    }

    /// Monotonic seconds since process start.
    pub fn uptime_s(&self) -> u64 {
        self.clock.ms_since(self.epoch) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trips() {
        let report = StatusReport {
            mode: ModeKind::Forward,
            speed_pwm: 191,
            range_cm: Some(23.4),
            target_m: 5.0,
            traveled_m: 1.27,
            dry_run: false,
            uptime_s: 482,
        };
        let text = report.to_string();
        assert!(text.starts_with(STATUS_BEGIN));
        assert!(text.ends_with(STATUS_END));
        let parsed: StatusReport = text.parse().unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn missing_range_prints_none() {
        let report = StatusReport {
            mode: ModeKind::Stopped,
            speed_pwm: 0,
            range_cm: None,
            target_m: 0.0,
            traveled_m: 0.0,
            dry_run: true,
            uptime_s: 0,
        };
        let text = report.to_string();
        assert!(text.contains("range_cm: none"));
        let parsed: StatusReport = text.parse().unwrap();
        assert_eq!(parsed.range_cm, None);
        assert!(parsed.dry_run);
    }
}
