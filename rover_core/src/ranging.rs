//! Cadence-gated ultrasonic sampling with last-known retention.
//!
//! The monitor owns the sensor and the latest good sample. A timed-out or
//! failed read is reported as "no reading" and the previous sample stays
//! available for telemetry; stale beats fabricated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rover_traits::{Clock, RangeSensor};

use crate::config::RangingCfg;

#[derive(Debug, Clone, Copy)]
pub struct RangeSample {
    pub distance_cm: f32,
    pub at: Instant,
}

pub struct RangeMonitor<R: RangeSensor> {
    sensor: R,
    clock: Arc<dyn Clock + Send + Sync>,
    period: Duration,
    timeout: Duration,
    last: Option<RangeSample>,
    next_due: Option<Instant>,
}

impl<R: RangeSensor> RangeMonitor<R> {
    pub fn new(sensor: R, cfg: &RangingCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let hz = cfg.poll_hz.max(1);
        Self {
            sensor,
            clock,
            period: Duration::from_micros(1_000_000 / u64::from(hz)),
            timeout: Duration::from_millis(cfg.echo_timeout_ms),
            last: None,
            next_due: None,
        }
    }

    /// Run one cadence-gated sampling attempt. Never fails the control loop;
    /// sensor trouble is logged and the last sample retained.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        if let Some(due) = self.next_due
            && now < due
        {
            return;
        }
        self.next_due = Some(now + self.period);

        match self.sensor.measure(self.timeout) {
            Ok(Some(distance_cm)) => {
                self.last = Some(RangeSample {
                    distance_cm,
                    at: now,
                });
            }
            Ok(None) => {
                tracing::debug!("sonar: no echo within bound");
            }
            Err(e) => {
                tracing::warn!(error = %e, "sonar read failed");
            }
        }
    }

    /// Latest good sample, if any reading has ever succeeded.
    pub fn last(&self) -> Option<&RangeSample> {
        self.last.as_ref()
    }

    pub fn last_cm(&self) -> Option<f32> {
        self.last.map(|s| s.distance_cm)
    }
}
