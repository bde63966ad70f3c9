#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and validation for the rover.
//!
//! One TOML file holds everything the firmware used to keep in free-standing
//! globals: pin numbers, the dead-reckoning calibration constant, cadences,
//! the command-source authority, and the dry-run flag. The struct is built
//! once at startup, validated, and passed by reference; nothing here is
//! mutated afterwards.

use serde::Deserialize;

/// Serial link to the host (and, when authoritative, the wireless bridge).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Host-facing port, e.g. "/dev/ttyUSB0" or "/dev/ttyS0"
    pub port: String,
    pub baud: u32,
    /// Line device for the secondary wireless path (HC-05 style RFCOMM)
    pub wireless_port: String,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".into(),
            baud: 115_200,
            wireless_port: "/dev/rfcomm0".into(),
        }
    }
}

/// BCM pin assignments for the H-bridge and the ultrasonic sensor.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub left_fwd: u8,
    pub left_rev: u8,
    pub left_en: u8,
    pub right_fwd: u8,
    pub right_rev: u8,
    pub right_en: u8,
    pub sonar_trig: u8,
    pub sonar_echo: u8,
}

/// Drive geometry and the dead-reckoning calibration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Drive {
    /// Calibrated straight-line speed at nominal duty (meters per second).
    /// Sole determinant of distance-target accuracy; tune per chassis.
    pub speed_m_per_s: f32,
    /// Time for a full 360° spin at nominal duty (milliseconds); turn
    /// durations interpolate linearly from this.
    pub full_turn_ms: u64,
    /// Startup PWM duty as a percentage (0-100)
    pub default_speed_pct: f32,
    /// Control loop period in milliseconds
    pub loop_period_ms: u64,
}

impl Default for Drive {
    fn default() -> Self {
        Self {
            speed_m_per_s: 0.30,
            full_turn_ms: 2000,
            default_speed_pct: 75.0,
            loop_period_ms: 20,
        }
    }
}

/// Ultrasonic ranging cadence and bounds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ranging {
    pub poll_hz: u32,
    /// Max wait for the echo pulse per measurement (ms)
    pub echo_timeout_ms: u64,
}

impl Default for Ranging {
    fn default() -> Self {
        Self {
            poll_hz: 10,
            echo_timeout_ms: 30,
        }
    }
}

/// Periodic status telemetry.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Report {
    /// Unsolicited status block period in seconds (0 disables the cadence;
    /// explicit STATUS commands still work)
    pub period_s: u64,
}

impl Default for Report {
    fn default() -> Self {
        Self { period_s: 5 }
    }
}

/// Which command source the controller obeys. Fixed at startup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    #[default]
    Serial,
    Wireless,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Transport {
    pub authority: Authority,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Hardware {
    /// Log intended actuation without touching GPIO
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub serial: Serial,
    #[serde(default)]
    pub drive: Drive,
    #[serde(default)]
    pub ranging: Ranging,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.port.is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.transport.authority == Authority::Wireless && self.serial.wireless_port.is_empty() {
            eyre::bail!("serial.wireless_port must not be empty when authority = \"wireless\"");
        }

        // Drive
        if !(self.drive.speed_m_per_s > 0.0) || !self.drive.speed_m_per_s.is_finite() {
            eyre::bail!("drive.speed_m_per_s must be > 0");
        }
        if self.drive.full_turn_ms == 0 {
            eyre::bail!("drive.full_turn_ms must be >= 1");
        }
        if self.drive.full_turn_ms > 60_000 {
            eyre::bail!("drive.full_turn_ms is unreasonably large (>60s)");
        }
        if !(0.0..=100.0).contains(&self.drive.default_speed_pct) {
            eyre::bail!("drive.default_speed_pct must be in [0, 100]");
        }
        if self.drive.loop_period_ms == 0 {
            eyre::bail!("drive.loop_period_ms must be >= 1");
        }
        if self.drive.loop_period_ms > 1000 {
            eyre::bail!("drive.loop_period_ms is unreasonably large (>1s)");
        }

        // Ranging
        if self.ranging.poll_hz == 0 {
            eyre::bail!("ranging.poll_hz must be > 0");
        }
        if self.ranging.echo_timeout_ms == 0 {
            eyre::bail!("ranging.echo_timeout_ms must be >= 1");
        }
        if self.ranging.echo_timeout_ms > 1000 {
            eyre::bail!("ranging.echo_timeout_ms is unreasonably large (>1s)");
        }

        // Pins: all distinct
        let pins = [
            self.pins.left_fwd,
            self.pins.left_rev,
            self.pins.left_en,
            self.pins.right_fwd,
            self.pins.right_rev,
            self.pins.right_en,
            self.pins.sonar_trig,
            self.pins.sonar_echo,
        ];
        for (i, a) in pins.iter().enumerate() {
            for b in pins.iter().skip(i + 1) {
                if a == b {
                    eyre::bail!("pin {} assigned to more than one function", a);
                }
            }
        }

        Ok(())
    }
}
