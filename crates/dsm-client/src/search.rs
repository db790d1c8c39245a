//! Asynchronous File Station search.
//!
//! The remote search runs as a server-side task: `start` hands out a task id,
//! the task is polled until it reports `finished`, the matches are fetched
//! once and the task is stopped. The stop call is issued exactly once for
//! every task that was started, whether collecting the results worked or not.

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::api::ApiRequest;
use crate::models::{FolderListing, SearchMatch};
use crate::task::{poll_until_finished, PollError, PollSettings};
use crate::{DsmError, SessionManager};

pub const SEARCH_API: &str = "SYNO.FileStation.Search";
const SEARCH_VERSION: u32 = 2;
/// Limit sent with status probes; the search API reports `finished` through
/// `list`, and a limit of 0 would mean "everything".
const STATUS_PROBE_LIMIT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub folder_path: String,
    pub pattern: String,
    pub extension: Option<String>,
    pub recursive: bool,
}

impl SearchRequest {
    pub fn new(folder_path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            pattern: pattern.into(),
            extension: None,
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub task_id: String,
    pub matches: Vec<SearchMatch>,
    /// Total matches reported by the server, may exceed `matches.len()`
    pub total: u64,
    pub polls: u32,
}

pub struct SearchOrchestrator<'a> {
    session: &'a SessionManager,
    settings: PollSettings,
    result_limit: u32,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(session: &'a SessionManager, settings: PollSettings, result_limit: u32) -> Self {
        Self {
            session,
            settings,
            result_limit,
        }
    }

    pub async fn run(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, DsmError> {
        let task_id = self.start(request).await?;
        tracing::info!(
            task_id = %task_id,
            folder = %request.folder_path,
            pattern = %request.pattern,
            "Search task started"
        );

        let outcome = self.collect(&task_id, cancel).await;
        self.stop(&task_id).await;
        outcome
    }

    async fn start(&self, request: &SearchRequest) -> Result<String, DsmError> {
        let mut call = ApiRequest::get(SEARCH_API, SEARCH_VERSION, "start")
            .json_param("folder_path", &json!([request.folder_path]))
            .param("pattern", request.pattern.clone())
            .bool_param("recursive", request.recursive);
        if let Some(extension) = &request.extension {
            call = call.param("extension", extension.clone());
        }

        let data = self
            .session
            .execute(&call)
            .await
            .map_err(|e| match e {
                DsmError::RemoteCall { .. } => DsmError::SearchStart {
                    message: e.remote_message(),
                },
                other => other,
            })?;

        data.get("taskid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DsmError::SearchStart {
                message: "response did not contain a task id".to_string(),
            })
    }

    async fn collect(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, DsmError> {
        let polls = poll_until_finished(self.settings, cancel, move || self.status(task_id))
            .await
            .map_err(|e| match e {
                PollError::TimedOut => DsmError::SearchTimeout {
                    task_id: task_id.to_string(),
                    timeout: self.settings.timeout,
                },
                PollError::Cancelled => DsmError::Cancelled {
                    task_id: task_id.to_string(),
                },
                PollError::Failed(e) => self.result_error(task_id, e),
            })?;

        tracing::debug!(task_id, polls, "Search task finished");

        let listing = self.list(task_id).await?;
        Ok(SearchOutcome {
            task_id: task_id.to_string(),
            total: listing.total.max(listing.files.len() as u64),
            matches: listing.files.into_iter().map(SearchMatch::from).collect(),
            polls,
        })
    }

    async fn status(&self, task_id: &str) -> Result<bool, DsmError> {
        let call = ApiRequest::get(SEARCH_API, SEARCH_VERSION, "list")
            .param("taskid", task_id)
            .param("offset", "0")
            .param("limit", STATUS_PROBE_LIMIT.to_string());
        let data = self.session.execute(&call).await?;
        Ok(data.get("finished").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn list(&self, task_id: &str) -> Result<FolderListing, DsmError> {
        let call = ApiRequest::get(SEARCH_API, SEARCH_VERSION, "list")
            .param("taskid", task_id)
            .param("offset", "0")
            .param("limit", self.result_limit.to_string())
            .json_param("additional", &json!(["size"]));

        let data = self
            .session
            .execute(&call)
            .await
            .map_err(|e| self.result_error(task_id, e))?;

        serde_json::from_value(data).map_err(|e| DsmError::SearchResult {
            task_id: task_id.to_string(),
            message: format!("malformed result list: {}", e),
        })
    }

    async fn stop(&self, task_id: &str) {
        let call = ApiRequest::get(SEARCH_API, SEARCH_VERSION, "stop").param("taskid", task_id);
        if let Err(e) = self.session.execute(&call).await {
            tracing::warn!(task_id, error = %e, "Failed to stop search task");
        }
    }

    fn result_error(&self, task_id: &str, error: DsmError) -> DsmError {
        match error {
            DsmError::RemoteCall { .. } => DsmError::SearchResult {
                task_id: task_id.to_string(),
                message: error.remote_message(),
            },
            other => other,
        }
    }
}
