use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rover_core::mocks::{
    DriveAction, ManualClock, QueueSource, RecordingDrivetrain, ScriptedRangeSensor,
};
use rover_core::{
    Arbiter, Authority, DriveCfg, FrameSource, Pilot, RangeMonitor, RangingCfg, ReportCfg,
    Reporter, RunParams, protocol, run,
};

/// Source that raises the shutdown flag after a fixed number of polls, so
/// the loop gets enough iterations to play out timers before exiting.
struct TimedSource {
    inner: QueueSource,
    polls_left: u32,
    shutdown: Arc<AtomicBool>,
}

impl TimedSource {
    fn new(lines: &[&str], polls: u32, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            inner: QueueSource::new(lines.iter().copied()),
            polls_left: polls,
            shutdown,
        }
    }
}

impl FrameSource for TimedSource {
    fn poll_line(&mut self) -> io::Result<Option<String>> {
        if self.polls_left == 0 {
            self.shutdown.store(true, Ordering::Relaxed);
            return Ok(None);
        }
        self.polls_left -= 1;
        self.inner.poll_line()
    }
}

struct Fixture {
    log: Arc<std::sync::Mutex<Vec<DriveAction>>>,
    shutdown: Arc<AtomicBool>,
}

fn run_loop(lines: &[&str], polls: u32, authority: Authority) -> (String, Fixture) {
    // The loop's own sleep drives this clock forward deterministically.
    let shared: Arc<dyn rover_traits::Clock + Send + Sync> = Arc::new(ManualClock::new());

    let drive = RecordingDrivetrain::new();
    let log = drive.log();
    let cfg = DriveCfg {
        speed_m_per_s: 1.0,
        full_turn_ms: 2000,
        default_speed_pct: 75.0,
    };
    let pilot = Pilot::new(drive, cfg, Arc::clone(&shared));

    let sonar = ScriptedRangeSensor::new([Some(42.0), None, Some(40.0)]);
    let ranging = RangeMonitor::new(sonar, &RangingCfg::default(), Arc::clone(&shared));

    let reporter = Reporter::new(&ReportCfg { period_s: 0 }, Arc::clone(&shared));

    let shutdown = Arc::new(AtomicBool::new(false));
    let arbiter = Arbiter::new(
        authority,
        TimedSource::new(lines, polls, Arc::clone(&shutdown)),
    );

    let mut out: Vec<u8> = Vec::new();
    run(
        pilot,
        ranging,
        reporter,
        arbiter,
        &mut out,
        Arc::clone(&shutdown),
        shared,
        RunParams {
            loop_period: Duration::from_millis(20),
            dry_run: true,
        },
    )
    .expect("loop exits cleanly");

    (
        String::from_utf8(out).expect("protocol output is ASCII"),
        Fixture { log, shutdown },
    )
}

#[test]
fn emits_banner_then_ready_sentinel() {
    let (out, _fx) = run_loop(&[], 1, Authority::HostSerial);
    let ready_at = out.find(protocol::READY).expect("readiness line");
    assert!(out[..ready_at].contains("rover motion controller"));
}

#[test]
fn command_gets_echo_then_ack_and_target_reached_once() {
    // 1 m at 1 m/s with a 20 ms loop period: reached after 50 iterations
    let (out, fx) = run_loop(&["FORWARD,1,meter"], 120, Authority::HostSerial);

    assert!(out.contains("cmd: FORWARD 1 meter"));
    assert_eq!(out.matches(protocol::ACK).count(), 1);
    assert_eq!(out.matches(protocol::TARGET_REACHED).count(), 1);
    assert_eq!(
        fx.log.lock().unwrap().last(),
        Some(&DriveAction::Stop),
        "halted on shutdown"
    );
}

#[test]
fn malformed_frame_is_reported_with_no_side_effect() {
    let (out, fx) = run_loop(&["FORWARD;1;meter"], 3, Authority::HostSerial);

    assert!(out.contains("err: malformed frame"));
    assert!(!out.contains(protocol::ACK));
    // Only the shutdown halt touches the drivetrain
    assert_eq!(*fx.log.lock().unwrap(), vec![DriveAction::Stop]);
}

#[test]
fn status_request_emits_parseable_block() {
    let (out, _fx) = run_loop(
        &["SPEED,50,percent", "STATUS,0,none"],
        6,
        Authority::HostSerial,
    );

    let begin = out.find(protocol::STATUS_BEGIN).expect("status begin");
    let end = out.find(protocol::STATUS_END).expect("status end");
    let block = &out[begin..end + protocol::STATUS_END.len()];
    let report: rover_core::StatusReport = block.parse().expect("block round-trips");
    assert_eq!(report.speed_pwm, 128);
    assert!(report.dry_run);
    assert_eq!(report.range_cm, Some(42.0));
}

#[test]
fn frames_wait_while_a_turn_is_live() {
    // 90° = 500 ms = 25 loop iterations; the STOP frame must not be drained
    // until the turn completes.
    let (out, _fx) = run_loop(
        &["LEFT,90,degree", "STOP,0,none"],
        120,
        Authority::HostSerial,
    );

    let turn_done = out.find("turn complete").expect("turn completes");
    let stop_echo = out.find("cmd: STOP").expect("stop is eventually drained");
    assert!(
        turn_done < stop_echo,
        "stop was dispatched during the turn maneuver"
    );
}

#[test]
fn unknown_command_reports_vocabulary() {
    let (out, _fx) = run_loop(&["DANCE,1,none"], 3, Authority::HostSerial);
    assert!(out.contains("err: unknown command 'DANCE'"));
    assert!(out.contains("FORWARD, BACKWARD, LEFT, RIGHT, STOP, SPEED, STATUS"));
}

#[test]
fn wireless_vocabulary_drives_the_same_machine() {
    let (out, fx) = run_loop(&["V40", "F", "S"], 8, Authority::Wireless);

    assert!(out.contains("cmd: SPEED 40 percent"));
    assert!(out.contains("cmd: FORWARD -1 continuous"));
    assert!(out.contains("cmd: STOP 0 none"));
    // 40% -> 102/255
    let log = fx.log.lock().unwrap();
    assert!(log.contains(&DriveAction::Forward(102)));
    assert!(fx.shutdown.load(Ordering::Relaxed));
}
