//! Dual H-bridge (L298N style) drivetrain on Raspberry Pi GPIO.
//!
//! Each side gets a forward/reverse pin pair plus an enable pin carrying a
//! software-PWM duty. The five motion primitives reduce to a direction-pin
//! truth table with the same duty applied to both sides.

use rppal::gpio::{Gpio, OutputPin};
use rover_traits::Drivetrain;
use tracing::trace;

use crate::DrivePins;
use crate::error::{HwError, Result};

/// Soft-PWM carrier on the enable pins. Above audible, well within what the
/// rppal software PWM thread sustains.
const PWM_HZ: f64 = 1_000.0;

pub struct L298n {
    left_fwd: OutputPin,
    left_rev: OutputPin,
    left_en: OutputPin,
    right_fwd: OutputPin,
    right_rev: OutputPin,
    right_en: OutputPin,
}

/// One side's direction. Fwd/Rev drive the pin pair asymmetrically; Off
/// lets the motor freewheel.
#[derive(Clone, Copy)]
enum Side {
    Fwd,
    Rev,
    Off,
}

impl L298n {
    pub fn new(pins: DrivePins) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut get_out = |pin: u8| -> Result<OutputPin> {
            Ok(gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
                .into_output_low())
        };
        Ok(Self {
            left_fwd: get_out(pins.left_fwd)?,
            left_rev: get_out(pins.left_rev)?,
            left_en: get_out(pins.left_en)?,
            right_fwd: get_out(pins.right_fwd)?,
            right_rev: get_out(pins.right_rev)?,
            right_en: get_out(pins.right_en)?,
        })
    }

    fn apply(&mut self, left: Side, right: Side, duty: u8) -> Result<()> {
        set_pair(&mut self.left_fwd, &mut self.left_rev, left);
        set_pair(&mut self.right_fwd, &mut self.right_rev, right);
        let cycle = f64::from(duty) / 255.0;
        self.left_en
            .set_pwm_frequency(PWM_HZ, cycle)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.right_en
            .set_pwm_frequency(PWM_HZ, cycle)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        trace!(duty, "h-bridge applied");
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        set_pair(&mut self.left_fwd, &mut self.left_rev, Side::Off);
        set_pair(&mut self.right_fwd, &mut self.right_rev, Side::Off);
        self.left_en
            .clear_pwm()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.right_en
            .clear_pwm()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.left_en.set_low();
        self.right_en.set_low();
        trace!("h-bridge halted");
        Ok(())
    }
}

fn set_pair(fwd: &mut OutputPin, rev: &mut OutputPin, side: Side) {
    match side {
        Side::Fwd => {
            rev.set_low();
            fwd.set_high();
        }
        Side::Rev => {
            fwd.set_low();
            rev.set_high();
        }
        Side::Off => {
            fwd.set_low();
            rev.set_low();
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Drivetrain for L298n {
    fn forward(&mut self, duty: u8) -> std::result::Result<(), BoxError> {
        self.apply(Side::Fwd, Side::Fwd, duty)?;
        Ok(())
    }
    fn backward(&mut self, duty: u8) -> std::result::Result<(), BoxError> {
        self.apply(Side::Rev, Side::Rev, duty)?;
        Ok(())
    }
    fn turn_left(&mut self, duty: u8) -> std::result::Result<(), BoxError> {
        // Spin in place: sides counter-rotate
        self.apply(Side::Rev, Side::Fwd, duty)?;
        Ok(())
    }
    fn turn_right(&mut self, duty: u8) -> std::result::Result<(), BoxError> {
        self.apply(Side::Fwd, Side::Rev, duty)?;
        Ok(())
    }
    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        self.halt()?;
        Ok(())
    }
}

impl Drop for L298n {
    fn drop(&mut self) {
        // Leave the bridge de-energized no matter how we exit.
        let _ = self.halt();
    }
}
