//! The `{success, data, error}` wrapper every DSM web API response carries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::AUTH_API;
use crate::codes;
use crate::DsmError;

/// Per-path failure reported inside `error.errors[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    code: i64,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure { code: i64, errors: Vec<ErrorDetail> },
}

impl Envelope {
    pub fn parse(body: &[u8]) -> Result<Self, DsmError> {
        let raw: RawEnvelope = serde_json::from_slice(body)
            .map_err(|e| DsmError::InvalidResponse(format!("malformed envelope: {}", e)))?;

        if raw.success {
            return Ok(Self::Success(raw.data.unwrap_or(Value::Null)));
        }

        match raw.error {
            Some(error) => Ok(Self::Failure {
                code: error.code,
                errors: error.errors,
            }),
            None => Err(DsmError::InvalidResponse(
                "envelope reports failure without an error code".to_string(),
            )),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts the envelope into the call's payload.
    ///
    /// Session codes on any API other than Auth become `SessionExpired` so the
    /// session manager can recover; everything else is a `RemoteCall` failure.
    pub fn into_result(self, api: &str, method: &str) -> Result<Value, DsmError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure { code, .. } if api != AUTH_API && codes::is_session_expired(code) => {
                Err(DsmError::SessionExpired { code })
            }
            Self::Failure { code, errors } => {
                let mut message = codes::describe(api, code).to_string();
                if let Some(detail) = errors.iter().find(|d| d.code != code) {
                    message.push_str(&format!(": {}", codes::describe(api, detail.code)));
                    if let Some(path) = &detail.path {
                        message.push_str(&format!(" ({})", path));
                    }
                } else if let Some(path) = errors.iter().find_map(|d| d.path.as_deref()) {
                    message.push_str(&format!(" ({})", path));
                }

                Err(DsmError::RemoteCall {
                    api: api.to_string(),
                    method: method.to_string(),
                    code,
                    message,
                    errors,
                })
            }
        }
    }
}
