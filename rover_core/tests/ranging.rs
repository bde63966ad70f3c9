use std::sync::Arc;
use std::time::Duration;

use rover_core::mocks::{ManualClock, ScriptedRangeSensor};
use rover_core::{RangeMonitor, RangingCfg};

fn monitor(
    readings: impl IntoIterator<Item = Option<f32>>,
) -> (RangeMonitor<ScriptedRangeSensor>, ManualClock) {
    let clock = ManualClock::new();
    let cfg = RangingCfg {
        poll_hz: 10,
        echo_timeout_ms: 30,
    };
    let m = RangeMonitor::new(
        ScriptedRangeSensor::new(readings),
        &cfg,
        Arc::new(clock.clone()),
    );
    (m, clock)
}

#[test]
fn timeout_keeps_last_known_value() {
    let (mut m, clock) = monitor([Some(50.0), None, None, Some(30.0)]);

    m.poll();
    assert_eq!(m.last_cm(), Some(50.0));

    // Two timed-out cycles: the 50 cm sample survives
    for _ in 0..2 {
        clock.advance(Duration::from_millis(100));
        m.poll();
        assert_eq!(m.last_cm(), Some(50.0));
    }

    clock.advance(Duration::from_millis(100));
    m.poll();
    assert_eq!(m.last_cm(), Some(30.0));
}

#[test]
fn no_reading_before_first_echo() {
    let (mut m, _clock) = monitor([None]);
    m.poll();
    assert_eq!(m.last_cm(), None);
}

#[test]
fn polls_are_cadence_gated() {
    let (mut m, clock) = monitor([Some(50.0), Some(40.0)]);

    m.poll();
    assert_eq!(m.last_cm(), Some(50.0));

    // 10 Hz cadence: calls inside the 100 ms window don't touch the sensor
    for _ in 0..20 {
        clock.advance(Duration::from_millis(1));
        m.poll();
    }
    assert_eq!(m.last_cm(), Some(50.0));

    clock.advance(Duration::from_millis(100));
    m.poll();
    assert_eq!(m.last_cm(), Some(40.0));
}
