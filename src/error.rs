//! Error types for host-facing operations.
//!
//! Decoding the token stream never produces an [`Error`]; malformed input
//! simply ends playback. Errors are reserved for font loading and for calling
//! operations out of order.

use std::fmt;
use std::io;

/// Result type alias for fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fallible operations of this crate.
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading font files.
    Io(io::Error),
    /// No face in the font database matched the query.
    FontNotFound(String),
    /// A face was found but could not be parsed.
    FontLoad { face: u32, reason: String },
    /// `draw` was called without a valid measurement.
    NotMeasured,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::FontNotFound(query) => write!(f, "no font face matches {query}"),
            Self::FontLoad { face, reason } => {
                write!(f, "failed to load font face {face}: {reason}")
            }
            Self::NotMeasured => write!(f, "draw requested before a valid measurement"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
