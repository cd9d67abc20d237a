//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all session failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// The socket path is unsafe to bind (existing non-empty file, or too long).
    Precondition(String),
    /// The connector could not reach a listener.
    Connection(String),
    /// The peer answered a line with something other than `ACKNOWLEDGE`.
    Acknowledgment(String),
    /// A line cannot be sent as one wire line (it holds a line break).
    InvalidLine(String),
    /// The peer closed the stream while a control byte was expected.
    Disconnected(String),
    /// File-system or socket I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Precondition(msg) => write!(f, "precondition: {msg}"),
            Self::Connection(msg) => write!(f, "connection: {msg}"),
            Self::Acknowledgment(msg) => write!(f, "acknowledgment: {msg}"),
            Self::InvalidLine(msg) => write!(f, "invalid line: {msg}"),
            Self::Disconnected(msg) => write!(f, "disconnected: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
