use serde::Serialize;
use thiserror::Error;

use crate::models::UserId;

/// Failures a sync cycle can run into.
///
/// Every variant is caught at the cycle boundary and reported; none of them stops the process.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SyncError {
    /// The relational store could not be reached or the query failed.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The document store could not be reached or a command failed.
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    /// A row could not be read as a sample: no `userid`, or a value that is not a finite number.
    #[error("invalid sample for user {identity}: {reason}")]
    InvalidSample { identity: UserId, reason: String },
}

impl SyncError {
    /// Short machine-readable name, matching the `kind` tag of the serialized form.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::SinkUnavailable(_) => "sink_unavailable",
            Self::InvalidSample { .. } => "invalid_sample",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SyncError::InvalidSample {
            identity: UserId::new("u9"),
            reason: "value \"abc\" is not a finite number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid sample for user u9: value \"abc\" is not a finite number"
        );
        assert_eq!(
            SyncError::SourceUnavailable("connection refused".to_string()).to_string(),
            "source unavailable: connection refused"
        );
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let errors = [
            SyncError::SourceUnavailable(String::new()),
            SyncError::SinkUnavailable(String::new()),
            SyncError::InvalidSample {
                identity: UserId::new("u1"),
                reason: String::new(),
            },
        ];
        for err in errors {
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["kind"], err.kind());
        }
    }
}
