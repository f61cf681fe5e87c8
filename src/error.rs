//! Error types for density model construction

use std::fmt;

/// Errors that can occur while building the generation model
///
/// Generation itself never fails: sampling pressure only shows up as an
/// undercount. These errors cover configuration and input data.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityError {
    /// Generator tuning validation failed
    InvalidConfig(String),
    /// A cluster definition violates its invariants
    InvalidCluster { id: String, reason: String },
    /// A label definition violates its invariants
    InvalidLabel { name: String, reason: String },
    /// Two clusters or two labels share the same identifier
    DuplicateId(String),
    /// Land-mask polygon data is malformed
    PolygonData(String),
    /// A data file could not be read
    Io(String),
    /// A JSON catalog could not be parsed
    Catalog(String),
}

impl fmt::Display for DensityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            DensityError::InvalidCluster { id, reason } => {
                write!(f, "invalid cluster '{}': {}", id, reason)
            }
            DensityError::InvalidLabel { name, reason } => {
                write!(f, "invalid label '{}': {}", name, reason)
            }
            DensityError::DuplicateId(id) => write!(f, "duplicate identifier: {}", id),
            DensityError::PolygonData(msg) => write!(f, "malformed polygon data: {}", msg),
            DensityError::Io(msg) => write!(f, "i/o error: {}", msg),
            DensityError::Catalog(msg) => write!(f, "malformed catalog: {}", msg),
        }
    }
}

impl std::error::Error for DensityError {}

impl From<std::io::Error> for DensityError {
    fn from(err: std::io::Error) -> Self {
        DensityError::Io(err.to_string())
    }
}

/// Result type alias for density operations
pub type Result<T> = std::result::Result<T, DensityError>;
