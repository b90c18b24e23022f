//! Crate-wide error type.
//!
//! Every failure carries an [`ErrorKind`] so batch callers can tell an input
//! definition that is simply wrong (abort) from one test whose data could not
//! be analyzed (skip it and keep going).

use serde::Serialize;
use thiserror::Error;

/// Failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid aquifer/well/settings definition. Never silently defaulted.
    Configuration,
    /// The recorded series cannot support the analysis (too short, flat, ...).
    DataQuality,
    /// A numerical fit diverged or was singular.
    Convergence,
    /// File or stream failure in the boundary layer.
    Io,
}

impl ErrorKind {
    /// Whether a batch run should stop entirely on this kind of error.
    pub fn aborts_batch(self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::DataQuality => "data quality",
            ErrorKind::Convergence => "convergence",
            ErrorKind::Io => "io",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataQuality, message)
    }

    pub fn convergence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Convergence, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Process exit code used by the `slug` binary.
    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Configuration => 2,
            ErrorKind::DataQuality => 3,
            ErrorKind::Convergence => 4,
            ErrorKind::Io => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_abort_a_batch() {
        assert!(ErrorKind::Configuration.aborts_batch());
        assert!(!ErrorKind::DataQuality.aborts_batch());
        assert!(!ErrorKind::Convergence.aborts_batch());
        assert!(!ErrorKind::Io.aborts_batch());
    }

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let codes = [
            AppError::config("a").exit_code(),
            AppError::data("b").exit_code(),
            AppError::convergence("c").exit_code(),
            AppError::io("d").exit_code(),
        ];
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                assert_ne!(codes[i], codes[j]);
            }
        }
        assert_eq!(AppError::data("short series").to_string(), "short series");
    }
}
