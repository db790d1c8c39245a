//! Tool-level error type

use dsm_client::DsmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required argument '{field}'")]
    MissingArgument { field: String },

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Dsm(#[from] DsmError),
}

impl ToolError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingArgument {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Argument problems detected before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. } | Self::InvalidArgument { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            ToolError::missing("path").to_string(),
            "Missing required argument 'path'"
        );
        assert_eq!(
            ToolError::invalid("recursive", "expected a boolean").to_string(),
            "Invalid argument 'recursive': expected a boolean"
        );
    }

    #[test]
    fn dsm_errors_are_transparent() {
        let err = ToolError::from(DsmError::SessionExpired { code: 119 });
        assert_eq!(err.to_string(), "session expired (code 119)");
        assert!(!err.is_validation());
    }
}
