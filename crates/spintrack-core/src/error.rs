//! Error types raised by external collaborators.

use std::error::Error;
use std::fmt;

use crate::id::SolidId;

/// Errors from the geometry collaborator.
///
/// The tracker converts these into a per-particle stop status; they never
/// abort a multi-particle run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// The intersection search failed internally.
    QueryFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A collision referenced a solid the geometry does not know.
    UnknownSolid {
        /// The unknown solid id.
        id: SolidId,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => write!(f, "geometry query failed: {reason}"),
            Self::UnknownSolid { id } => write!(f, "unknown solid {id}"),
        }
    }
}

impl Error for GeometryError {}
