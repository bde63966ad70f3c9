//! Serial protocol line constants and formatting.
//!
//! Every string here is part of the host-facing contract: the host keys off
//! the sentinel lines, so they are fixed literals, never rephrased.

use crate::command::Command;

/// Readiness sentinel, emitted once after pins and sensors come up.
pub const READY: &str = "ROVER READY";
/// Acknowledgment sentinel, emitted once a command's immediate effect has
/// been applied (a pending distance target does not delay it).
pub const ACK: &str = "ACK";
/// Emitted exactly once when a distance-targeted move completes.
pub const TARGET_REACHED: &str = "TARGET REACHED";
pub const STATUS_BEGIN: &str = "=== ROVER STATUS ===";
pub const STATUS_END: &str = "=== END STATUS ===";

/// Valid command vocabulary, quoted back at the operator on unknown names.
pub const VOCABULARY: &str = "FORWARD, BACKWARD, LEFT, RIGHT, STOP, SPEED, STATUS";

pub fn banner() -> [String; 2] {
    [
        format!("rover motion controller v{}", env!("CARGO_PKG_VERSION")),
        "serial command protocol: COMMAND,VALUE,UNIT".to_string(),
    ]
}

/// Human-readable echo of a received command.
pub fn echo_line(cmd: &Command) -> String {
    format!("cmd: {} {} {}", cmd.name, cmd.value, cmd.unit)
}

pub fn malformed_line() -> String {
    "err: malformed frame (want COMMAND,VALUE,UNIT)".to_string()
}

pub fn unknown_line(token: &str) -> String {
    format!("err: unknown command '{token}' (expected {VOCABULARY})")
}
