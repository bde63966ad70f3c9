//! Human-readable error descriptions, structured JSON errors, and stable
//! exit codes.

use rover_core::RoverError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(re) = err.downcast_ref::<RoverError>() {
        return match re {
            RoverError::Hardware(msg) => format!(
                "What happened: A drivetrain or sensor call failed ({msg}).\nLikely causes: Wrong [pins] values, missing GPIO permissions, or a disconnected driver board.\nHow to fix: Check wiring and the [pins] table; try `rover run --dry-run` to validate the rest of the stack."
            ),
            RoverError::Transport(msg) => format!(
                "What happened: The command transport failed ({msg}).\nLikely causes: Serial device unplugged, wrong serial.port path, or another process holding the port.\nHow to fix: Verify the device path (e.g. /dev/ttyUSB0), close other serial monitors, then rerun."
            ),
            RoverError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open serial port") {
        return "What happened: The serial port could not be opened.\nLikely causes: Wrong serial.port path, missing permissions (dialout group), or the device is in use.\nHow to fix: Check the path and permissions, stop other serial monitors, or pass --port.".to_string();
    }

    if lower.contains("read config") || lower.contains("parse config") {
        return "What happened: The config file could not be read or parsed.\nLikely causes: Wrong --config path or malformed TOML.\nHow to fix: Point --config at a valid file; see etc/rover_config.toml for a sample.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 0 ok, 1 generic, 2 configuration, 3 transport/serial.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(re) = err.downcast_ref::<RoverError>() {
        return match re {
            RoverError::Config(_) => 2,
            RoverError::Transport(_) => 3,
            RoverError::Hardware(_) => 1,
        };
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("config") {
        return 2;
    }
    if lower.contains("serial") {
        return 3;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = match err.downcast_ref::<RoverError>() {
        Some(RoverError::Hardware(_)) => "Hardware",
        Some(RoverError::Transport(_)) => "Transport",
        Some(RoverError::Config(_)) => "Config",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_exit_code_2() {
        let err = eyre::Report::new(RoverError::Config("bad pins".into()));
        assert_eq!(exit_code_for_error(&err), 2);
        assert!(humanize(&err).contains("Invalid configuration"));
    }

    #[test]
    fn transport_errors_map_to_exit_code_3() {
        let err = eyre::Report::new(RoverError::Transport("device gone".into()));
        assert_eq!(exit_code_for_error(&err), 3);
    }

    #[test]
    fn json_form_carries_reason_and_message() {
        let err = eyre::Report::new(RoverError::Hardware("gpio error".into()));
        let parsed: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(parsed["reason"], "Hardware");
        assert!(parsed["message"].as_str().unwrap().contains("drivetrain"));
    }
}
