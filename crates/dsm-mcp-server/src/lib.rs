//! MCP tool server for Synology DSM File Station.
//!
//! Tool calls arrive as JSON-RPC over stdio and are translated into
//! `auth.cgi` / `entry.cgi` requests by [`dsm_client`].

pub mod args;
pub mod cli;
pub mod error;
pub mod format;
pub mod paths;
pub mod server;
pub mod shutdown;
pub mod tools;

pub use cli::Cli;
pub use error::ToolError;
pub use server::McpServer;
pub use tools::ToolExecutor;
