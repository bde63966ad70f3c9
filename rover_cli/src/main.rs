//! Rover CLI: config loading, tracing setup, hardware assembly, and the
//! `run` / `self-check` entry points.

mod cli;
mod error_fmt;
mod transport;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use rover_core::{
    Arbiter, Authority, Pilot, RangeMonitor, RangingCfg, Reporter, RoverError, RunParams,
};
use rover_traits::{Clock, Drivetrain, MonotonicClock, RangeSensor};

use crate::cli::{AuthorityArg, Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    let _ = color_eyre::install();

    std::process::exit(match real_main(args) {
        Ok(()) => 0,
        Err(err) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            error_fmt::exit_code_for_error(&err)
        }
    });
}

fn real_main(args: Cli) -> eyre::Result<()> {
    let cfg = load_config(&args.config)?;
    init_tracing(&cfg.logging, &args)?;

    match args.cmd {
        Commands::Run {
            port,
            dry_run,
            authority,
        } => cmd_run(&cfg, port, dry_run, authority),
        Commands::SelfCheck => cmd_self_check(&cfg),
    }
}

fn load_config(path: &Path) -> eyre::Result<rover_config::Config> {
    let text = fs::read_to_string(path)
        .map_err(|e| RoverError::Config(format!("read config {}: {e}", path.display())))?;
    let cfg = rover_config::load_toml(&text)
        .map_err(|e| RoverError::Config(format!("parse config: {e}")))?;
    cfg.validate()
        .map_err(|e| RoverError::Config(e.to_string()))?;
    Ok(cfg)
}

fn init_tracing(logcfg: &rover_config::Logging, args: &Cli) -> eyre::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Precedence: RUST_LOG, then an explicit --log-level, then the config.
    let level = if args.log_level == "info" {
        logcfg.level.as_deref().unwrap_or("info")
    } else {
        args.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match &logcfg.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "rover.log".as_ref());
            let appender = match logcfg.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer))
        }
        None => None,
    };

    // Console logs go to stderr; stdout belongs to the serial-less dev flow.
    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if args.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

type BoxDrive = Box<dyn Drivetrain>;
type BoxSonar = Box<dyn RangeSensor>;

/// Assemble the drivetrain and ranging sensor: real GPIO when built with the
/// `hardware` feature and not in dry-run, simulated (log-only) otherwise.
fn build_hardware(cfg: &rover_config::Config, dry_run: bool) -> eyre::Result<(BoxDrive, BoxSonar)> {
    #[cfg(feature = "hardware")]
    if !dry_run {
        let drive = rover_hardware::L298n::new(rover_hardware::DrivePins {
            left_fwd: cfg.pins.left_fwd,
            left_rev: cfg.pins.left_rev,
            left_en: cfg.pins.left_en,
            right_fwd: cfg.pins.right_fwd,
            right_rev: cfg.pins.right_rev,
            right_en: cfg.pins.right_en,
        })
        .map_err(|e| RoverError::Hardware(e.to_string()))
        .wrap_err("open h-bridge pins")?;
        let sonar = rover_hardware::Hcsr04::new(cfg.pins.sonar_trig, cfg.pins.sonar_echo)
            .map_err(|e| RoverError::Hardware(e.to_string()))
            .wrap_err("open sonar pins")?;
        return Ok((Box::new(drive), Box::new(sonar)));
    }

    #[cfg(not(feature = "hardware"))]
    if !dry_run {
        tracing::warn!("built without the hardware feature; actuation is simulated");
    }
    let _ = cfg;
    Ok((
        Box::new(rover_hardware::SimulatedDrivetrain::new()),
        Box::new(rover_hardware::SimulatedRangeSensor::new()),
    ))
}

fn cmd_run(
    cfg: &rover_config::Config,
    port_override: Option<String>,
    dry_run_flag: bool,
    authority_override: Option<AuthorityArg>,
) -> eyre::Result<()> {
    let dry_run = dry_run_flag || cfg.hardware.dry_run;
    let authority: Authority = match authority_override {
        Some(AuthorityArg::Serial) => Authority::HostSerial,
        Some(AuthorityArg::Wireless) => Authority::Wireless,
        None => cfg.transport.authority.into(),
    };
    let path = port_override.unwrap_or_else(|| match authority {
        Authority::HostSerial => cfg.serial.port.clone(),
        Authority::Wireless => cfg.serial.wireless_port.clone(),
    });

    let port = transport::open_port(&path, cfg.serial.baud)?;
    let writer = port
        .try_clone()
        .map_err(|e| RoverError::Transport(format!("clone serial handle: {e}")))?;
    let source = transport::SerialLineSource::new(port);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install ctrl-c handler")?;
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let (drive, sonar) = build_hardware(cfg, dry_run)?;

    let pilot = Pilot::new(drive, (&cfg.drive).into(), Arc::clone(&clock));
    let ranging_cfg: RangingCfg = (&cfg.ranging).into();
    let ranging = RangeMonitor::new(sonar, &ranging_cfg, Arc::clone(&clock));
    let reporter = Reporter::new(&(&cfg.report).into(), Arc::clone(&clock));
    let arbiter = Arbiter::new(authority, source);

    tracing::info!(
        port = %path,
        baud = cfg.serial.baud,
        ?authority,
        dry_run,
        speed_m_per_s = cfg.drive.speed_m_per_s,
        "rover starting"
    );

    rover_core::run(
        pilot,
        ranging,
        reporter,
        arbiter,
        writer,
        shutdown,
        clock,
        RunParams {
            loop_period: Duration::from_millis(cfg.drive.loop_period_ms),
            dry_run,
        },
    )
}

/// Assemble everything except the serial port in dry-run form and exercise
/// one call per device. Catches config and wiring-shape mistakes early.
fn cmd_self_check(cfg: &rover_config::Config) -> eyre::Result<()> {
    let (mut drive, mut sonar) = build_hardware(cfg, true)?;
    drive
        .stop()
        .map_err(|e| RoverError::Hardware(e.to_string()))
        .wrap_err("probe drivetrain")?;
    let reading = sonar
        .measure(Duration::from_millis(cfg.ranging.echo_timeout_ms))
        .map_err(|e| RoverError::Hardware(e.to_string()))
        .wrap_err("probe sonar")?;

    println!(
        "config: authority={:?} speed={} m/s full_turn={} ms",
        cfg.transport.authority, cfg.drive.speed_m_per_s, cfg.drive.full_turn_ms
    );
    match reading {
        Some(cm) => println!("sonar: {cm:.1} cm"),
        None => println!("sonar: no echo"),
    }
    println!("self-check ok");
    Ok(())
}
