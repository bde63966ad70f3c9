//! Mappings from the TOML schema (`rover_config`) to the runtime structs.

use crate::arbiter::Authority;
use crate::config::{DriveCfg, RangingCfg, ReportCfg};

impl From<&rover_config::Drive> for DriveCfg {
    fn from(d: &rover_config::Drive) -> Self {
        Self {
            speed_m_per_s: d.speed_m_per_s,
            full_turn_ms: d.full_turn_ms,
            default_speed_pct: d.default_speed_pct,
        }
    }
}

impl From<&rover_config::Ranging> for RangingCfg {
    fn from(r: &rover_config::Ranging) -> Self {
        Self {
            poll_hz: r.poll_hz,
            echo_timeout_ms: r.echo_timeout_ms,
        }
    }
}

impl From<&rover_config::Report> for ReportCfg {
    fn from(r: &rover_config::Report) -> Self {
        Self { period_s: r.period_s }
    }
}

impl From<rover_config::Authority> for Authority {
    fn from(a: rover_config::Authority) -> Self {
        match a {
            rover_config::Authority::Serial => Authority::HostSerial,
            rover_config::Authority::Wireless => Authority::Wireless,
        }
    }
}
