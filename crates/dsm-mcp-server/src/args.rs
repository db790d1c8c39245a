//! Typed access to `tools/call` arguments.
//!
//! Every accessor names the offending field in its error so the caller can
//! correct the call without guessing.

use serde_json::{Map, Value};

use crate::error::ToolError;

pub struct ToolArgs {
    fields: Map<String, Value>,
}

impl ToolArgs {
    /// Accepts an object or `null` (tools without arguments).
    pub fn new(args: Value) -> Result<Self, ToolError> {
        match args {
            Value::Object(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self { fields: Map::new() }),
            _ => Err(ToolError::invalid("arguments", "expected an object")),
        }
    }

    fn present(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn required_str(&self, field: &str) -> Result<&str, ToolError> {
        match self.present(field) {
            None => Err(ToolError::missing(field)),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(ToolError::invalid(field, "must not be empty"))
            }
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(ToolError::invalid(field, "expected a string")),
        }
    }

    /// Like [`Self::required_str`] but empty strings are accepted.
    pub fn required_text(&self, field: &str) -> Result<&str, ToolError> {
        match self.present(field) {
            None => Err(ToolError::missing(field)),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(ToolError::invalid(field, "expected a string")),
        }
    }

    pub fn optional_str(&self, field: &str) -> Result<Option<&str>, ToolError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ToolError::invalid(field, "expected a string")),
        }
    }

    pub fn optional_bool(&self, field: &str) -> Result<Option<bool>, ToolError> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ToolError::invalid(field, "expected a boolean")),
        }
    }

    pub fn bool_or(&self, field: &str, default: bool) -> Result<bool, ToolError> {
        Ok(self.optional_bool(field)?.unwrap_or(default))
    }

    pub fn optional_u64(&self, field: &str) -> Result<Option<u64>, ToolError> {
        match self.present(field) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .map(Some)
                .ok_or_else(|| ToolError::invalid(field, "expected a non-negative integer")),
        }
    }
}
