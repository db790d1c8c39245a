//! Tool execution for the MCP server

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use dsm_client::{FileStation, SearchRequest, ShareLinkOptions, UploadOptions};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::format;
use crate::paths;

/// Default cap for `read_file` output.
pub const DEFAULT_MAX_READ_BYTES: u64 = 1024 * 1024;
const DEFAULT_SHARE_LINK_LIMIT: u64 = 50;

pub struct ToolExecutor {
    files: FileStation,
    shutdown: CancellationToken,
}

impl ToolExecutor {
    pub fn new(files: FileStation, shutdown: CancellationToken) -> Self {
        Self { files, shutdown }
    }

    pub fn files(&self) -> &FileStation {
        &self.files
    }

    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<String, ToolError> {
        let args = ToolArgs::new(args)?;
        match tool_name {
            // Session
            "syno_login" => self.login().await,
            "syno_logout" => self.logout().await,

            // Browsing
            "list_folders" => self.list_folders(&args).await,
            "read_file" => self.read_file(&args).await,
            "search_files" => self.search_files(&args).await,

            // Mutations
            "write_file" => self.write_file(&args).await,
            "create_folder" => self.create_folder(&args).await,
            "delete_item" => self.delete_item(&args).await,
            "rename_item" => self.rename_item(&args).await,
            "move_item" => self.move_item(&args).await,

            // Sharing
            "list_share_links" => self.list_share_links(&args).await,
            "create_share_link" => self.create_share_link(&args).await,

            // Server
            "get_server_info" => self.server_info().await,
            "get_quota_info" => self.quota_info().await,

            _ => Err(ToolError::UnknownTool(tool_name.to_string())),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    async fn login(&self) -> Result<String, ToolError> {
        let session = self.files.session();
        session.logout().await;
        session.login().await?;
        Ok(format!("Logged in as {}", session.account()))
    }

    async fn logout(&self) -> Result<String, ToolError> {
        let session = self.files.session();
        if !session.is_logged_in().await {
            return Ok("No active session".to_string());
        }
        session.logout().await;
        Ok("Logged out".to_string())
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    async fn list_folders(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;

        if paths::is_root(&path) {
            let shares = self.files.list_shares(false).await?;
            return Ok(format::render_shares(&shares.shares));
        }

        let listing = self.files.list_folder(&path).await?;
        Ok(format::render_listing(&path, &listing.files))
    }

    async fn read_file(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;
        let max_bytes = args
            .optional_u64("max_bytes")?
            .unwrap_or(DEFAULT_MAX_READ_BYTES);
        if max_bytes == 0 {
            return Err(ToolError::invalid("max_bytes", "must be greater than zero"));
        }

        let bytes = self.files.download(&path).await?;
        let limit = usize::try_from(max_bytes).unwrap_or(usize::MAX);
        if bytes.len() <= limit {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        let mut text = String::from_utf8_lossy(&bytes[..limit]).into_owned();
        text.push_str(&format!(
            "\n\n[truncated: showing {} of {} bytes]",
            limit,
            bytes.len()
        ));
        Ok(text)
    }

    async fn search_files(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let folder_path = paths::normalize("folder_path", args.required_str("folder_path")?)?;
        let pattern = args.required_str("pattern")?.trim();

        let request = SearchRequest::new(folder_path.as_str(), pattern);
        let outcome = self.files.search(&request, &self.shutdown).await?;
        tracing::debug!(
            task_id = %outcome.task_id,
            polls = outcome.polls,
            matches = outcome.matches.len(),
            "Search finished"
        );
        Ok(format::render_search(&folder_path, pattern, &outcome))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    async fn write_file(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;
        let content = args.required_text("content")?;
        let options = UploadOptions {
            overwrite: args.bool_or("overwrite", false)?,
            create_parents: args.bool_or("create_parents", false)?,
        };
        let (folder, file_name) = paths::split_parent("path", &path)?;

        self.files
            .upload(&folder, &file_name, content.as_bytes().to_vec(), options)
            .await?;
        Ok(format!("Wrote {} bytes to {}", content.len(), path))
    }

    async fn create_folder(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let folder_path = paths::normalize("folder_path", args.required_str("folder_path")?)?;
        let name = args.required_str("name")?.trim();
        paths::validate_name("name", name)?;
        let force_parent = args.bool_or("force_parent", false)?;

        let created = self
            .files
            .create_folder(&folder_path, name, force_parent)
            .await?;
        let created_path = created
            .first()
            .map(|entry| entry.path.clone())
            .unwrap_or_else(|| format!("{}/{}", folder_path.trim_end_matches('/'), name));
        Ok(format!("Created folder {}", created_path))
    }

    async fn delete_item(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;
        if paths::is_root(&path) {
            return Err(ToolError::invalid("path", "refusing to delete the root"));
        }
        let recursive = args.bool_or("recursive", true)?;

        self.files.delete(&path, recursive).await?;
        Ok(format!("Deleted {}", path))
    }

    async fn rename_item(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;
        let new_name = args.required_str("new_name")?.trim();
        paths::validate_name("new_name", new_name)?;

        let renamed = self.files.rename(&path, new_name).await?;
        let new_path = renamed
            .first()
            .map(|entry| entry.path.clone())
            .unwrap_or_else(|| new_name.to_string());
        Ok(format!("Renamed {} to {}", path, new_path))
    }

    async fn move_item(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let source = paths::normalize("source_path", args.required_str("source_path")?)?;
        let dest = paths::normalize(
            "dest_folder_path",
            args.required_str("dest_folder_path")?,
        )?;
        let overwrite = args.bool_or("overwrite", false)?;

        self.files
            .move_to(&source, &dest, overwrite, &self.shutdown)
            .await?;
        Ok(format!("Moved {} to {}", source, dest))
    }

    // =========================================================================
    // Sharing
    // =========================================================================

    async fn list_share_links(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let offset = args.optional_u64("offset")?.unwrap_or(0);
        let limit = args
            .optional_u64("limit")?
            .unwrap_or(DEFAULT_SHARE_LINK_LIMIT);

        let page = self.files.list_share_links(offset, limit).await?;
        Ok(format::render_share_links(&page))
    }

    async fn create_share_link(&self, args: &ToolArgs) -> Result<String, ToolError> {
        let path = paths::normalize("path", args.required_str("path")?)?;
        let date_expired = args.optional_str("date_expired")?;
        if let Some(date) = date_expired {
            if !is_iso_date(date) {
                return Err(ToolError::invalid("date_expired", "expected YYYY-MM-DD"));
            }
        }
        let options = ShareLinkOptions {
            password: args
                .optional_str("password")?
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            date_expired: date_expired.map(str::to_string),
        };

        let links = self.files.create_share_link(&path, &options).await?;
        let urls: Vec<&str> = links.iter().map(|link| link.url.as_str()).collect();
        if urls.is_empty() {
            return Ok(format!("Share link created for {}", path));
        }
        Ok(format!("Share link for {}: {}", path, urls.join(", ")))
    }

    // =========================================================================
    // Server
    // =========================================================================

    async fn server_info(&self) -> Result<String, ToolError> {
        let info = self.files.info().await?;
        Ok(format::render_server_info(&info))
    }

    async fn quota_info(&self) -> Result<String, ToolError> {
        let shares = self.files.list_shares(true).await?;
        Ok(format::render_quota(&shares.shares))
    }
}

fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2030-01-31"));
        assert!(!is_iso_date("2030-1-31"));
        assert!(!is_iso_date("tomorrow!!"));
    }
}
