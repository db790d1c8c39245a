//! DSM Client - Synology DSM File Station web API
//!
//! This crate talks to the `webapi/auth.cgi` and `webapi/entry.cgi` endpoints
//! of a DSM host:
//! - [`ApiClient`] sends single requests and decodes the response envelope
//! - [`SessionManager`] owns the session id and recovers from expiry
//! - [`SearchOrchestrator`] drives the start/poll/list/stop search protocol
//! - [`FileStation`] exposes the typed file operations

mod api;
mod codes;
mod config;
mod envelope;
mod error;
mod file_station;
mod models;
mod search;
mod session;
mod task;

pub use api::{ApiClient, ApiRequest, Endpoint, FilePart, RequestBody, AUTH_API};
pub use codes::{describe as describe_error_code, SESSION_EXPIRED_CODES};
pub use config::{DsmConfig, DEFAULT_API_VERSION, DEFAULT_SESSION_NAME};
pub use envelope::{Envelope, ErrorDetail};
pub use error::DsmError;
pub use file_station::{FileStation, ShareLinkOptions, UploadOptions};
pub use models::{
    FileAdditional, FileEntry, FileTime, FolderListing, SearchMatch, ServerInfo, ShareLink,
    ShareLinkPage, ShareListing, StringOrList, VolumeStatus,
};
pub use search::{SearchOrchestrator, SearchOutcome, SearchRequest, SEARCH_API};
pub use session::{EnsuredSession, SessionManager, SessionOrigin, SessionState};
pub use task::PollSettings;
pub use tokio_util::sync::CancellationToken;
