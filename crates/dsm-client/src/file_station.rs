//! Typed File Station operations on top of a [`SessionManager`].

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiRequest, FilePart};
use crate::models::{FileEntry, FolderListing, ServerInfo, ShareLink, ShareLinkPage, ShareListing};
use crate::search::{SearchOrchestrator, SearchOutcome, SearchRequest};
use crate::task::{poll_until_finished, PollError, PollSettings};
use crate::{DsmConfig, DsmError, SessionManager};

const INFO_API: &str = "SYNO.FileStation.Info";
const LIST_API: &str = "SYNO.FileStation.List";
const DOWNLOAD_API: &str = "SYNO.FileStation.Download";
const UPLOAD_API: &str = "SYNO.FileStation.Upload";
const CREATE_FOLDER_API: &str = "SYNO.FileStation.CreateFolder";
const DELETE_API: &str = "SYNO.FileStation.Delete";
const RENAME_API: &str = "SYNO.FileStation.Rename";
const COPY_MOVE_API: &str = "SYNO.FileStation.CopyMove";
const SHARING_API: &str = "SYNO.FileStation.Sharing";

const V2: u32 = 2;
const V3: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub overwrite: bool,
    pub create_parents: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareLinkOptions {
    pub password: Option<String>,
    /// `YYYY-MM-DD`
    pub date_expired: Option<String>,
}

pub struct FileStation {
    session: Arc<SessionManager>,
    poll: PollSettings,
    search_result_limit: u32,
}

impl FileStation {
    pub fn new(session: Arc<SessionManager>, config: &DsmConfig) -> Self {
        Self {
            session,
            poll: PollSettings::new(config.poll_interval, config.task_timeout),
            search_result_limit: config.search_result_limit,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn info(&self) -> Result<ServerInfo, DsmError> {
        let request = ApiRequest::get(INFO_API, V2, "get");
        self.fetch(&request).await
    }

    /// With `with_volume_status`, each share also carries its `real_path` so
    /// callers can tell which shares live on the same volume.
    pub async fn list_shares(&self, with_volume_status: bool) -> Result<ShareListing, DsmError> {
        let mut request = ApiRequest::get(LIST_API, V2, "list_share");
        if with_volume_status {
            request = request.json_param("additional", &json!(["real_path", "volume_status"]));
        }
        self.fetch(&request).await
    }

    pub async fn list_folder(&self, folder_path: &str) -> Result<FolderListing, DsmError> {
        let request = ApiRequest::get(LIST_API, V2, "list")
            .param("folder_path", folder_path)
            .json_param("additional", &json!(["size", "time"]));
        self.fetch(&request).await
    }

    pub async fn download(&self, path: &str) -> Result<Vec<u8>, DsmError> {
        let request = ApiRequest::get(DOWNLOAD_API, V2, "download")
            .param("path", path)
            .param("mode", "open");
        self.session.execute_download(&request).await
    }

    /// Uploads `content` as `file_name` inside `folder_path`.
    pub async fn upload(
        &self,
        folder_path: &str,
        file_name: &str,
        content: Vec<u8>,
        options: UploadOptions,
    ) -> Result<(), DsmError> {
        let request = ApiRequest::post(UPLOAD_API, V2, "upload")
            .param("path", folder_path)
            .bool_param("create_parents", options.create_parents)
            .bool_param("overwrite", options.overwrite)
            .with_file(FilePart {
                file_name: file_name.to_string(),
                bytes: content,
            });
        self.session.execute(&request).await.map(|_| ())
    }

    pub async fn create_folder(
        &self,
        folder_path: &str,
        name: &str,
        force_parent: bool,
    ) -> Result<Vec<FileEntry>, DsmError> {
        let request = ApiRequest::get(CREATE_FOLDER_API, V2, "create")
            .param("folder_path", folder_path)
            .param("name", name)
            .bool_param("force_parent", force_parent);
        let data = self.session.execute(&request).await?;
        decode_list(data, "folders")
    }

    pub async fn delete(&self, path: &str, recursive: bool) -> Result<(), DsmError> {
        let request = ApiRequest::post(DELETE_API, V2, "delete")
            .param("path", path)
            .bool_param("recursive", recursive);
        self.session.execute(&request).await.map(|_| ())
    }

    pub async fn rename(&self, path: &str, new_name: &str) -> Result<Vec<FileEntry>, DsmError> {
        let request = ApiRequest::post(RENAME_API, V2, "rename")
            .param("path", path)
            .param("name", new_name);
        let data = self.session.execute(&request).await?;
        decode_list(data, "files")
    }

    /// Moves `path` into `dest_folder_path` and waits for the background
    /// task to finish. The task is stopped if it does not finish in time.
    pub async fn move_to(
        &self,
        path: &str,
        dest_folder_path: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<(), DsmError> {
        let start = ApiRequest::post(COPY_MOVE_API, V3, "start")
            .param("path", path)
            .param("dest_folder_path", dest_folder_path)
            .bool_param("overwrite", overwrite)
            .bool_param("remove_src", true);
        let data = self.session.execute(&start).await?;
        let task_id = data
            .get("taskid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DsmError::InvalidResponse("CopyMove start did not return a task id".into())
            })?
            .to_string();

        tracing::info!(
            task_id = %task_id,
            source = path,
            dest = dest_folder_path,
            "Move task started"
        );

        let task_ref = task_id.as_str();
        let result =
            poll_until_finished(self.poll, cancel, move || self.copy_move_status(task_ref)).await;
        match result {
            Ok(polls) => {
                tracing::debug!(task_id = %task_id, polls, "Move task finished");
                Ok(())
            }
            Err(PollError::Failed(e)) => Err(e),
            Err(interrupted) => {
                let stop =
                    ApiRequest::get(COPY_MOVE_API, V3, "stop").param("taskid", task_id.clone());
                if let Err(e) = self.session.execute(&stop).await {
                    tracing::warn!(task_id = %task_id, error = %e, "Failed to stop move task");
                }
                Err(match interrupted {
                    PollError::Cancelled => DsmError::Cancelled { task_id },
                    _ => DsmError::TaskTimeout {
                        api: COPY_MOVE_API.to_string(),
                        task_id,
                        timeout: self.poll.timeout,
                    },
                })
            }
        }
    }

    async fn copy_move_status(&self, task_id: &str) -> Result<bool, DsmError> {
        let request = ApiRequest::get(COPY_MOVE_API, V3, "status").param("taskid", task_id);
        let data = self.session.execute(&request).await?;
        Ok(data.get("finished").and_then(Value::as_bool).unwrap_or(false))
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, DsmError> {
        SearchOrchestrator::new(&self.session, self.poll, self.search_result_limit)
            .run(request, cancel)
            .await
    }

    pub async fn list_share_links(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<ShareLinkPage, DsmError> {
        let request = ApiRequest::get(SHARING_API, V3, "list")
            .param("offset", offset.to_string())
            .param("limit", limit.to_string());
        self.fetch(&request).await
    }

    pub async fn create_share_link(
        &self,
        path: &str,
        options: &ShareLinkOptions,
    ) -> Result<Vec<ShareLink>, DsmError> {
        let mut request = ApiRequest::post(SHARING_API, V3, "create").param("path", path);
        if let Some(password) = &options.password {
            request = request.param("password", password.clone());
        }
        if let Some(date) = &options.date_expired {
            request = request.param("date_expired", date.clone());
        }
        let data = self.session.execute(&request).await?;
        decode_list(data, "links")
    }

    async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, DsmError> {
        let data = self.session.execute(request).await?;
        serde_json::from_value(data).map_err(|e| {
            DsmError::InvalidResponse(format!(
                "unexpected {}.{} payload: {}",
                request.api, request.method, e
            ))
        })
    }
}

fn decode_list<T: DeserializeOwned>(data: Value, key: &str) -> Result<Vec<T>, DsmError> {
    match data.get(key) {
        Some(items) => serde_json::from_value(items.clone())
            .map_err(|e| DsmError::InvalidResponse(format!("unexpected '{}' list: {}", key, e))),
        None => Ok(Vec::new()),
    }
}
