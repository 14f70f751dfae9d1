//! Common error types for driveocr.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::RemoteStep;

/// Top-level error type for driveocr operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials file unreadable or not a valid OAuth client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization code could not be read or exchanged.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The local target file could not be read.
    #[error("Can't open {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A call against the document service failed.
    #[error("Failed {step}: {message}")]
    Remote { step: RemoteStep, message: String },

    /// The token cache could not be written.
    #[error("Unable to cache oauth token: {0}")]
    CacheWrite(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build a remote error for the given pipeline step.
    pub fn remote(step: RemoteStep, message: impl Into<String>) -> Self {
        Self::Remote {
            step,
            message: message.into(),
        }
    }

    /// Process exit code for this error kind (sysexits.h values).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,
            Self::Authentication(_) => 77,
            Self::LocalIo { .. } => 66,
            Self::Remote { .. } => 69,
            Self::CacheWrite(_) => 73,
            Self::Io(_) | Self::Serialization(_) | Self::InvalidInput(_) => 1,
        }
    }

    /// The remote step that failed, if this is a remote error.
    pub fn remote_step(&self) -> Option<RemoteStep> {
        match self {
            Self::Remote { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_names_step() {
        let err = Error::remote(RemoteStep::Export, "500 Internal Server Error");
        assert_eq!(err.to_string(), "Failed export: 500 Internal Server Error");
        assert_eq!(err.remote_step(), Some(RemoteStep::Export));
    }

    #[test]
    fn test_local_io_display() {
        let err = Error::LocalIo {
            path: PathBuf::from("notes.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Can't open notes.png: missing");
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let errors = [
            Error::Config("x".into()),
            Error::Authentication("x".into()),
            Error::LocalIo {
                path: PathBuf::from("x"),
                source: std::io::Error::other("x"),
            },
            Error::remote(RemoteStep::Upload, "x"),
            Error::CacheWrite("x".into()),
        ];

        let mut codes: Vec<u8> = errors.iter().map(Error::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }
}
