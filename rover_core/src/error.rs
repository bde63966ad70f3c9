use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RoverError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Frame-level failures. Only an unframeable line is an error; an unknown
/// command name still parses (see `CommandName::Unknown`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed frame (want COMMAND,VALUE,UNIT)")]
    MalformedFrame,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
