//! Mesh file import and export.

#[cfg(feature = "stl-io")]
mod stl;

use crate::errors::MeshError;

/// Errors raised while reading or writing mesh files.
///
/// Format support sits behind cargo feature flags; with every format
/// disabled only the variants themselves remain.
#[derive(Debug)]
pub enum IoError {
    StdIo(std::io::Error),

    /// The file parsed but does not describe a valid mesh.
    Mesh(MeshError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use IoError::*;

        match self {
            StdIo(error) => write!(f, "std::io::Error: {error}"),
            Mesh(error) => write!(f, "Invalid mesh: {error}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::StdIo(error) => Some(error),
            IoError::Mesh(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(value: std::io::Error) -> Self {
        Self::StdIo(value)
    }
}

impl From<MeshError> for IoError {
    fn from(value: MeshError) -> Self {
        Self::Mesh(value)
    }
}
