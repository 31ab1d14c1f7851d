//! Error taxonomy for the analytics pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by loading, uploading, clustering and access control.
///
/// Too little data for clustering is not represented here: it is a normal
/// outcome of [`crate::model::segment`] that routes to fallback analytics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no connection log for {business_type} at {}", path.display())]
    NotFound { business_type: String, path: PathBuf },

    #[error("could not parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("upload is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("cluster count must be between 2 and 5, got {0}")]
    InvalidClusterCount(usize),

    #[error("unknown business type: {0}")]
    UnknownBusinessType(String),

    #[error("invalid username or password")]
    Unauthorized,

    #[error("permission denied: requires {required}, signed in as {actual}")]
    PermissionDenied { required: String, actual: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("automation rule not found: {0}")]
    RuleNotFound(String),

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<linfa_clustering::KMeansError> for Error {
    fn from(e: linfa_clustering::KMeansError) -> Self {
        Error::Clustering(e.to_string())
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(e: ndarray::ShapeError) -> Self {
        Error::Clustering(e.to_string())
    }
}

impl Error {
    /// Whether the error belongs to the caller's request rather than the system
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::Parse { .. }
                | Error::MissingColumns { .. }
                | Error::InvalidClusterCount(_)
                | Error::UnknownBusinessType(_)
                | Error::Unauthorized
                | Error::PermissionDenied { .. }
                | Error::InvalidInput(_)
                | Error::RuleNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_names() {
        let err = Error::MissingColumns {
            missing: vec!["device_type".to_string(), "duration".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "upload is missing required columns: device_type, duration"
        );
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_io_is_not_user_facing() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(!err.is_user_facing());
    }
}
