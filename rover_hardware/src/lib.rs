//! Hardware backends for the rover.
//!
//! The simulated drivetrain and range sensor are always available and carry
//! the dry-run behavior: every intended actuation is logged, nothing touches
//! GPIO. The real backends live behind the `hardware` feature and use rppal
//! (Raspberry Pi only).

pub mod error;
#[cfg(feature = "hardware")]
pub mod hcsr04;
#[cfg(feature = "hardware")]
pub mod l298n;

use std::time::Duration;

use rover_traits::{Drivetrain, RangeSensor};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Log-only drivetrain used for dry-run validation without a chassis.
#[derive(Debug, Default)]
pub struct SimulatedDrivetrain;

impl SimulatedDrivetrain {
    pub fn new() -> Self {
        Self
    }
}

impl Drivetrain for SimulatedDrivetrain {
    fn forward(&mut self, duty: u8) -> Result<(), BoxError> {
        tracing::info!(duty, "drivetrain: forward (simulated)");
        Ok(())
    }
    fn backward(&mut self, duty: u8) -> Result<(), BoxError> {
        tracing::info!(duty, "drivetrain: backward (simulated)");
        Ok(())
    }
    fn turn_left(&mut self, duty: u8) -> Result<(), BoxError> {
        tracing::info!(duty, "drivetrain: turn left (simulated)");
        Ok(())
    }
    fn turn_right(&mut self, duty: u8) -> Result<(), BoxError> {
        tracing::info!(duty, "drivetrain: turn right (simulated)");
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        tracing::info!("drivetrain: stop (simulated)");
        Ok(())
    }
}

/// Simulated ultrasonic sensor reporting a slowly shrinking range, as if the
/// rover were approaching a wall. Good enough to exercise telemetry paths.
pub struct SimulatedRangeSensor {
    distance_cm: f32,
}

impl SimulatedRangeSensor {
    pub fn new() -> Self {
        Self { distance_cm: 250.0 }
    }
}

impl Default for SimulatedRangeSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn measure(&mut self, _timeout: Duration) -> Result<Option<f32>, BoxError> {
        self.distance_cm = (self.distance_cm - 1.0).max(12.0);
        tracing::trace!(distance_cm = self.distance_cm, "sonar (simulated)");
        Ok(Some(self.distance_cm))
    }
}

/// Pin assignments for the real backends, decoupled from the config crate.
#[cfg(feature = "hardware")]
#[derive(Debug, Clone, Copy)]
pub struct DrivePins {
    pub left_fwd: u8,
    pub left_rev: u8,
    pub left_en: u8,
    pub right_fwd: u8,
    pub right_rev: u8,
    pub right_en: u8,
}

#[cfg(feature = "hardware")]
pub use hcsr04::Hcsr04;
#[cfg(feature = "hardware")]
pub use l298n::L298n;
