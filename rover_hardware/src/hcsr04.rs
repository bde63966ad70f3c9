//! HC-SR04 ultrasonic ranging on Raspberry Pi GPIO.
//!
//! Trigger-and-timeout protocol: a 10 µs trigger pulse, then a bounded wait
//! for the echo pulse. The pulse width maps to centimeters through the speed
//! of sound; a missing echo is reported as `None`, never as a fake distance.

use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, OutputPin};
use rover_traits::RangeSensor;
use tracing::trace;

use crate::error::{HwError, Result};

/// Speed of sound at ~20 °C, in cm per microsecond, halved for the round trip.
const CM_PER_US_ROUND_TRIP: f32 = 0.0343 / 2.0;

pub struct Hcsr04 {
    trig: OutputPin,
    echo: InputPin,
}

impl Hcsr04 {
    pub fn new(trig_pin: u8, echo_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut trig = gpio
            .get(trig_pin)
            .map_err(|e| HwError::Gpio(format!("pin {trig_pin}: {e}")))?
            .into_output_low();
        let echo = gpio
            .get(echo_pin)
            .map_err(|e| HwError::Gpio(format!("pin {echo_pin}: {e}")))?
            .into_input();
        trig.set_low();
        Ok(Self { trig, echo })
    }

    /// One trigger/echo cycle. `Ok(None)` when the echo never arrives (or
    /// never ends) within `timeout`.
    pub fn measure_once(&mut self, timeout: Duration) -> Result<Option<f32>> {
        let deadline = Instant::now() + timeout;

        // 10 µs trigger pulse
        self.trig.set_high();
        spin_sleep(Duration::from_micros(10));
        self.trig.set_low();

        // Echo rise
        while self.echo.is_low() {
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::hint::spin_loop();
        }
        let rise = Instant::now();

        // Echo fall
        while self.echo.is_high() {
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::hint::spin_loop();
        }
        let pulse_us = rise.elapsed().as_micros() as f32;

        let distance_cm = pulse_us * CM_PER_US_ROUND_TRIP;
        trace!(pulse_us, distance_cm, "sonar echo");
        Ok(Some(distance_cm))
    }
}

/// Busy-wait for sub-millisecond pulses; thread::sleep is too coarse here.
#[inline]
fn spin_sleep(d: Duration) {
    let until = Instant::now() + d;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl RangeSensor for Hcsr04 {
    fn measure(&mut self, timeout: Duration) -> std::result::Result<Option<f32>, BoxError> {
        Ok(self.measure_once(timeout)?)
    }
}
