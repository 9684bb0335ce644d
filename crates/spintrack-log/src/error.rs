//! Error types for record output.

use std::fmt;
use std::io;

/// Errors raised while writing records.
#[derive(Debug)]
pub enum LogError {
    /// An I/O error occurred while creating or writing a file.
    Io(io::Error),
    /// A record was written after the sink was closed.
    Closed {
        /// The stream that was written to.
        stream: &'static str,
    },
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Closed { stream } => write!(f, "write to closed {stream} stream"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Closed { .. } => None,
        }
    }
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
