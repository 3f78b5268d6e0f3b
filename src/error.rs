//! Error kinds shared across the crate.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Everything that can go wrong between reading a lens mesh and putting
/// its caustic on screen or on disk.
#[derive(Debug)]
pub enum CausticError {
    /// Missing, malformed or out-of-range command-line or configuration input.
    Argument(String),
    /// The mesh file could not be read or is structurally invalid.
    Parse { path: PathBuf, reason: String },
    /// Refraction could not produce a direction, either for the whole input
    /// (`index` is `None`) or for a single vertex.
    Refraction { index: Option<usize>, reason: String },
    /// Rays could not be intersected with the receiver plane.
    Projection(String),
    /// Writing the PPM image failed.
    Export { path: PathBuf, source: io::Error },
    /// The window could not be set up.
    PlatformInit(String),
}

impl CausticError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CausticError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CausticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CausticError::Argument(msg) => write!(f, "invalid argument: {}", msg),
            CausticError::Parse { path, reason } => {
                write!(f, "failed to parse mesh {}: {}", path.display(), reason)
            }
            CausticError::Refraction {
                index: Some(index),
                reason,
            } => write!(f, "refraction failed at vertex {}: {}", index, reason),
            CausticError::Refraction { index: None, reason } => {
                write!(f, "refraction failed: {}", reason)
            }
            CausticError::Projection(msg) => write!(f, "projection failed: {}", msg),
            CausticError::Export { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            CausticError::PlatformInit(msg) => write!(f, "window initialisation failed: {}", msg),
        }
    }
}

impl std::error::Error for CausticError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CausticError::Export { source, .. } => Some(source),
            _ => None,
        }
    }
}
