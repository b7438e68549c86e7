//! Domain error types
//!
//! Errors are domain-specific and don't expose driver or third-party types.
//! The taxonomy distinguishes fatal resolver-level failures (bad input, empty
//! invoice set, unreachable analytical store) from per-invoice enrichment
//! failures, which are absorbed and degrade to blank fields instead of
//! surfacing here.

use thiserror::Error;

/// Main export error type
///
/// This is the primary error type used throughout the pipeline. Anything that
/// reaches the caller carries a human-readable message; nothing is retried
/// automatically.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Malformed dates, start later than end, or a missing entity code.
    /// Surfaced verbatim to the caller; the job is never created.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The discovery query ran but matched nothing. The status counters are
    /// zeroed before this is raised.
    #[error("No invoices found in the primary store for the requested range and entity")]
    NoInvoicesFound,

    /// The analytical store is unreachable or the batch enrichment query
    /// failed. The message carries operator guidance plus the underlying
    /// cause.
    #[error("Could not read the FURIPS enrichment tables (MySQL). Verify that the documental database is replicated and the required tables exist. Detail: {0}")]
    EnrichmentUnavailable(String),

    /// An output line failed its fixed-column invariant after padding.
    #[error("{file} must have {expected} columns (invoice {invoice}, got {actual})")]
    FieldCount {
        file: &'static str,
        invoice: String,
        expected: usize,
        actual: usize,
    },

    /// Store client errors (connection, statement execution)
    #[error("Store error: {0}")]
    Store(String),

    /// Job-state persistence errors
    #[error("State error: {0}")]
    State(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors (plan file, output files, logs)
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExportError {
    /// True for failures the caller produced (and can correct), as opposed
    /// to infrastructure failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidInput(_) | ExportError::NoInvoicesFound
        )
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = ExportError::InvalidInput("start date after end date".to_string());
        assert_eq!(err.to_string(), "Invalid input: start date after end date");
    }

    #[test]
    fn test_field_count_display_names_the_invoice() {
        let err = ExportError::FieldCount {
            file: "FURIPS1",
            invoice: "FV00123".to_string(),
            expected: 102,
            actual: 101,
        };
        let msg = err.to_string();
        assert!(msg.contains("FURIPS1"));
        assert!(msg.contains("FV00123"));
        assert!(msg.contains("102"));
    }

    #[test]
    fn test_user_error_classification() {
        assert!(ExportError::NoInvoicesFound.is_user_error());
        assert!(ExportError::InvalidInput("x".into()).is_user_error());
        assert!(!ExportError::Store("down".into()).is_user_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_enrichment_unavailable_carries_guidance() {
        let err = ExportError::EnrichmentUnavailable("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("replicated"));
        assert!(msg.contains("connection refused"));
    }
}
