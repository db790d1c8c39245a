//! Error types for DSM web API calls

use std::time::Duration;
use thiserror::Error;

use crate::envelope::ErrorDetail;

#[derive(Debug, Error)]
pub enum DsmError {
    #[error("authentication failed: {reason}")]
    Authentication { code: Option<i64>, reason: String },

    #[error("session expired (code {code})")]
    SessionExpired { code: i64 },

    #[error("{api}.{method} failed: {message} (code {code})")]
    RemoteCall {
        api: String,
        method: String,
        code: i64,
        message: String,
        errors: Vec<ErrorDetail>,
    },

    #[error("failed to start search: {message}")]
    SearchStart { message: String },

    #[error("failed to fetch results of search task {task_id}: {message}")]
    SearchResult { task_id: String, message: String },

    #[error("search task {task_id} did not finish within {timeout:?}")]
    SearchTimeout { task_id: String, timeout: Duration },

    #[error("{api} task {task_id} did not finish within {timeout:?}")]
    TaskTimeout {
        api: String,
        task_id: String,
        timeout: Duration,
    },

    #[error("task {task_id} was cancelled")]
    Cancelled { task_id: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DsmError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Remote error code, when the failure came from a decoded envelope.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::SessionExpired { code } | Self::RemoteCall { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Human-readable message without the api/method prefix.
    pub(crate) fn remote_message(&self) -> String {
        match self {
            Self::RemoteCall { message, code, .. } => format!("{} (code {})", message, code),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_call_display_includes_code() {
        let err = DsmError::RemoteCall {
            api: "SYNO.FileStation.List".to_string(),
            method: "list".to_string(),
            code: 408,
            message: "No such file or directory".to_string(),
            errors: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "SYNO.FileStation.List.list failed: No such file or directory (code 408)"
        );
        assert_eq!(err.code(), Some(408));
    }

    #[test]
    fn session_expired_is_detected() {
        assert!(DsmError::SessionExpired { code: 119 }.is_session_expired());
        assert!(!DsmError::InvalidResponse("x".into()).is_session_expired());
    }
}
