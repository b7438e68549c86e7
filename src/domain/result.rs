//! Result type alias for the export pipeline

use crate::domain::errors::ExportError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, ExportError>;
