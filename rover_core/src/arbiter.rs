//! Transport arbitration: a single authoritative command source, fixed at
//! startup.
//!
//! The host-serial path speaks full `COMMAND,VALUE,UNIT` frames. The
//! secondary wireless path (active only when host serial is not in use)
//! speaks a reduced single-letter vocabulary plus a `V<percent>` speed
//! command. The two are never simultaneously authoritative; the choice is a
//! config value read once, not a runtime race.

use std::io;

use crate::command::{CONTINUOUS, Command, CommandName, parse_frame};
use crate::error::{Result, RoverError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    HostSerial,
    Wireless,
}

/// Line-oriented input owned by the arbiter. `Ok(None)` means no complete
/// line arrived this tick; the loop simply proceeds without a command.
pub trait FrameSource {
    fn poll_line(&mut self) -> io::Result<Option<String>>;
}

/// One drained input, pre-classified for the protocol layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(Command),
    /// Insufficient delimiters; reported, dropped, no side effect.
    Malformed,
}

pub struct Arbiter<S: FrameSource> {
    authority: Authority,
    source: S,
}

impl<S: FrameSource> Arbiter<S> {
    pub fn new(authority: Authority, source: S) -> Self {
        Self { authority, source }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Drain at most one line and decode it per the authoritative
    /// vocabulary.
    pub fn poll(&mut self) -> Result<Option<Inbound>> {
        let line = self
            .source
            .poll_line()
            .map_err(|e| RoverError::Transport(e.to_string()))?;
        let Some(line) = line else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let inbound = match self.authority {
            Authority::HostSerial => match parse_frame(line) {
                Ok(cmd) => Inbound::Frame(cmd),
                Err(e) => {
                    tracing::warn!(line = %line, error = %e, "dropping malformed frame");
                    Inbound::Malformed
                }
            },
            Authority::Wireless => Inbound::Frame(decode_short(line)),
        };
        Ok(Some(inbound))
    }
}

/// Wireless vocabulary: `F`,`B` continuous moves, `L`,`R` 90° turns, `S`
/// stop, `V<percent>` speed. Anything else is an unknown command.
pub fn decode_short(line: &str) -> Command {
    match line {
        "F" | "f" => Command::new(CommandName::Forward, CONTINUOUS, "continuous"),
        "B" | "b" => Command::new(CommandName::Backward, CONTINUOUS, "continuous"),
        "L" | "l" => Command::new(CommandName::Left, 90.0, "degree"),
        "R" | "r" => Command::new(CommandName::Right, 90.0, "degree"),
        "S" | "s" => Command::new(CommandName::Stop, 0.0, "none"),
        other => {
            if let Some(rest) = other.strip_prefix(['V', 'v']) {
                let pct = rest.trim().parse::<f32>().unwrap_or_else(|_| {
                    tracing::warn!(field = %rest, "wireless speed value unparseable, degrading to 0.0");
                    0.0
                });
                Command::new(CommandName::Speed, pct, "percent")
            } else {
                Command::new(CommandName::Unknown(other.to_string()), 0.0, "none")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_letters_map_to_commands() {
        assert_eq!(decode_short("F").name, CommandName::Forward);
        assert!(decode_short("F").is_continuous());
        assert_eq!(decode_short("L").value, 90.0);
        assert_eq!(decode_short("S").name, CommandName::Stop);
    }

    #[test]
    fn speed_prefix_carries_percent() {
        let cmd = decode_short("V75");
        assert_eq!(cmd.name, CommandName::Speed);
        assert_eq!(cmd.value, 75.0);
    }

    #[test]
    fn unknown_byte_is_reported_not_dropped() {
        let cmd = decode_short("X");
        assert_eq!(cmd.name, CommandName::Unknown("X".to_string()));
    }
}
