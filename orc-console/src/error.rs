//! Console error types

use crate::api::ApiError;
use crate::table::FilterError;
use thiserror::Error;

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A fetch against the API failed; the whole load is abandoned
    #[error("Failed to load venue data: {0}")]
    Api(#[from] ApiError),

    /// Configuration error, including missing required venue properties
    #[error(transparent)]
    Config(#[from] orc_common::Error),

    /// Filter text could not be parsed
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Console has no loaded data yet
    #[error("No venue data loaded")]
    NotLoaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_properties_message() {
        let err: ConsoleError =
            orc_common::Error::MissingProperties(vec!["venue_id".into(), "submission_id".into()])
                .into();
        assert_eq!(
            err.to_string(),
            "missing required properties: venue_id, submission_id"
        );
    }

    #[test]
    fn test_api_error_wraps() {
        let err: ConsoleError = ApiError::Status {
            status: 403,
            message: "Forbidden".into(),
        }
        .into();
        assert!(err.to_string().contains("403"));
    }
}
