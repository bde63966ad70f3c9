//! The `COMMAND,VALUE,UNIT` frame parser.
//!
//! A frame is one serial line, already stripped of its terminator. The name
//! field is case-normalized before matching; the unit field is an opaque
//! echo-only string and never interpreted.

use crate::error::ParseError;

/// Sentinel value meaning "continuous, no distance/angle target".
pub const CONTINUOUS: f32 = -1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandName {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Speed,
    Status,
    /// Well-formed frame, unrecognized name; the original token is kept for
    /// the error notice.
    Unknown(String),
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => f.write_str("FORWARD"),
            Self::Backward => f.write_str("BACKWARD"),
            Self::Left => f.write_str("LEFT"),
            Self::Right => f.write_str("RIGHT"),
            Self::Stop => f.write_str("STOP"),
            Self::Speed => f.write_str("SPEED"),
            Self::Status => f.write_str("STATUS"),
            Self::Unknown(tok) => write!(f, "{tok}"),
        }
    }
}

/// One parsed directive. Transient: one parse, one dispatch, not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: CommandName,
    pub value: f32,
    pub unit: String,
}

impl Command {
    pub fn new(name: CommandName, value: f32, unit: impl Into<String>) -> Self {
        Self {
            name,
            value,
            unit: unit.into(),
        }
    }

    /// True when `value` carries the continuous-move sentinel.
    pub fn is_continuous(&self) -> bool {
        self.value == CONTINUOUS
    }
}

/// Parse one frame. Exactly two field delimiters or the frame is rejected
/// with no side effect; a malformed numeric field degrades to 0.0 (logged,
/// never silent, since it can mask operator error).
pub fn parse_frame(line: &str) -> Result<Command, ParseError> {
    if line.matches(',').count() != 2 {
        return Err(ParseError::MalformedFrame);
    }
    let mut fields = line.splitn(3, ',');
    // splitn(3) on a line with exactly two commas always yields three fields
    let name_raw = fields.next().unwrap_or_default().trim();
    let value_raw = fields.next().unwrap_or_default().trim();
    let unit = fields.next().unwrap_or_default().trim();

    let name = match name_raw.to_ascii_uppercase().as_str() {
        "FORWARD" => CommandName::Forward,
        "BACKWARD" => CommandName::Backward,
        "LEFT" => CommandName::Left,
        "RIGHT" => CommandName::Right,
        "STOP" => CommandName::Stop,
        "SPEED" => CommandName::Speed,
        "STATUS" => CommandName::Status,
        other => CommandName::Unknown(other.to_string()),
    };

    let value = value_raw.parse::<f32>().unwrap_or_else(|_| {
        tracing::warn!(field = %value_raw, "numeric value field unparseable, degrading to 0.0");
        0.0
    });

    Ok(Command {
        name,
        value,
        unit: unit.to_string(),
    })
}
