//! Runtime configuration structs for the motion controller.
//!
//! These are the in-memory forms consumed by `Pilot`, `RangeMonitor`, and
//! `Reporter`. They are separate from the TOML-deserialized schema in
//! `rover_config`; see `conversions` for the mapping.

/// Drive geometry and dead-reckoning calibration.
#[derive(Debug, Clone)]
pub struct DriveCfg {
    /// Calibrated straight-line speed in meters per second. Open-loop: this
    /// constant is the sole determinant of distance-target accuracy.
    pub speed_m_per_s: f32,
    /// Duration of a full 360° spin in milliseconds; turn durations are
    /// linearly interpolated from it.
    pub full_turn_ms: u64,
    /// Initial PWM duty as a percentage (0-100).
    pub default_speed_pct: f32,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self {
            speed_m_per_s: 0.30,
            full_turn_ms: 2000,
            default_speed_pct: 75.0,
        }
    }
}

/// Ultrasonic sampling cadence and per-read bound.
#[derive(Debug, Clone)]
pub struct RangingCfg {
    pub poll_hz: u32,
    pub echo_timeout_ms: u64,
}

impl Default for RangingCfg {
    fn default() -> Self {
        Self {
            poll_hz: 10,
            echo_timeout_ms: 30,
        }
    }
}

/// Unsolicited status cadence. 0 disables the cadence; explicit STATUS
/// commands are unaffected.
#[derive(Debug, Clone)]
pub struct ReportCfg {
    pub period_s: u64,
}

impl Default for ReportCfg {
    fn default() -> Self {
        Self { period_s: 5 }
    }
}
