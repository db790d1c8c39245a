//! Remote path normalisation.
//!
//! File Station paths are absolute and start with the shared folder name,
//! e.g. `/photos/2024/beach.jpg`.

use crate::error::ToolError;

/// Adds the leading slash, collapses duplicate separators, drops `.` segments
/// and a trailing slash. `..` is refused.
pub fn normalize(field: &str, raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid(field, "path must not be empty"));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(ToolError::invalid(
                    field,
                    "relative segments ('..') are not allowed",
                ))
            }
            s => segments.push(s),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

pub fn is_root(path: &str) -> bool {
    path == "/"
}

/// Splits a normalised path into its parent folder and final component.
pub fn split_parent(field: &str, path: &str) -> Result<(String, String), ToolError> {
    match path.rsplit_once('/') {
        Some((parent, name)) if !parent.is_empty() && !name.is_empty() => {
            Ok((parent.to_string(), name.to_string()))
        }
        _ => Err(ToolError::invalid(
            field,
            "must name a file inside a shared folder, e.g. /share/file.txt",
        )),
    }
}

/// Rejects names containing a path separator.
pub fn validate_name(field: &str, name: &str) -> Result<(), ToolError> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(ToolError::invalid(
            field,
            "must be a single file or folder name without '/'",
        ));
    }
    Ok(())
}
