//! JSON-RPC 2.0 over newline-delimited stdio.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::tools::ToolExecutor;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "dsm-mcp";

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

impl JsonRpcResponse {
    fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    fn empty() -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            result: None,
            error: None,
        }
    }

    /// Notifications get no reply.
    fn should_send(&self) -> bool {
        self.id.is_some() || self.error.is_some()
    }
}

pub struct McpServer {
    executor: ToolExecutor,
}

impl McpServer {
    pub fn new(executor: ToolExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn tool_definitions(&self) -> Vec<Value> {
        vec![
            // Session
            json!({
                "name": "syno_login",
                "description": "Log in to the NAS again, replacing the current session.",
                "inputSchema": {"type": "object", "properties": {}}
            }),
            json!({
                "name": "syno_logout",
                "description": "End the current NAS session.",
                "inputSchema": {"type": "object", "properties": {}}
            }),
            // Browsing
            json!({
                "name": "list_folders",
                "description": "List the entries of a folder. Use '/' to list shared folders.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Folder path, e.g. /photos/2024"}
                    },
                    "required": ["path"]
                }
            }),
            json!({
                "name": "read_file",
                "description": "Read a file as UTF-8 text (invalid sequences are replaced).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "File path, e.g. /docs/notes.txt"},
                        "max_bytes": {"type": "integer", "minimum": 1, "default": 1048576}
                    },
                    "required": ["path"]
                }
            }),
            json!({
                "name": "search_files",
                "description": "Search a folder recursively for names matching a pattern. \
                    Wildcards (*, ?) are supported by the NAS.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "folder_path": {"type": "string", "description": "Folder to search in"},
                        "pattern": {"type": "string", "description": "Keyword or glob pattern"}
                    },
                    "required": ["folder_path", "pattern"]
                }
            }),
            // Mutations
            json!({
                "name": "write_file",
                "description": "Create or replace a text file.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Destination file path"},
                        "content": {"type": "string"},
                        "overwrite": {"type": "boolean", "default": false},
                        "create_parents": {"type": "boolean", "default": false}
                    },
                    "required": ["path", "content"]
                }
            }),
            json!({
                "name": "create_folder",
                "description": "Create a folder inside an existing folder.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "folder_path": {"type": "string", "description": "Parent folder"},
                        "name": {"type": "string", "description": "New folder name"},
                        "force_parent": {"type": "boolean", "default": false}
                    },
                    "required": ["folder_path", "name"]
                }
            }),
            json!({
                "name": "delete_item",
                "description": "Delete a file or folder.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string"},
                        "recursive": {"type": "boolean", "default": true}
                    },
                    "required": ["path"]
                }
            }),
            json!({
                "name": "rename_item",
                "description": "Rename a file or folder in place.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string"},
                        "new_name": {"type": "string", "description": "New name without any '/'"}
                    },
                    "required": ["path", "new_name"]
                }
            }),
            json!({
                "name": "move_item",
                "description": "Move a file or folder into another folder and wait for the move to finish.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "source_path": {"type": "string"},
                        "dest_folder_path": {"type": "string"},
                        "overwrite": {"type": "boolean", "default": false}
                    },
                    "required": ["source_path", "dest_folder_path"]
                }
            }),
            // Sharing
            json!({
                "name": "list_share_links",
                "description": "List existing share links.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "offset": {"type": "integer", "minimum": 0, "default": 0},
                        "limit": {"type": "integer", "minimum": 1, "default": 50}
                    }
                }
            }),
            json!({
                "name": "create_share_link",
                "description": "Create a public share link for a file or folder.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string"},
                        "password": {"type": "string"},
                        "date_expired": {"type": "string", "description": "Expiry date, YYYY-MM-DD"}
                    },
                    "required": ["path"]
                }
            }),
            // Server
            json!({
                "name": "get_server_info",
                "description": "Show File Station information about the NAS.",
                "inputSchema": {"type": "object", "properties": {}}
            }),
            json!({
                "name": "get_quota_info",
                "description": "Show used and free space per shared folder volume.",
                "inputSchema": {"type": "object", "properties": {}}
            }),
        ]
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "notifications/initialized" => JsonRpcResponse::empty(),
            "ping" => JsonRpcResponse::result(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "resources/list" => JsonRpcResponse::result(request.id, json!({"resources": []})),
            "prompts/list" => JsonRpcResponse::result(request.id, json!({"prompts": []})),
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::result(id, json!({ "tools": self.tool_definitions() }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => return JsonRpcResponse::error(id, -32602, "Missing params".to_string()),
        };

        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::info!(tool = tool_name, "Tool call");
        match self.executor.execute(tool_name, arguments).await {
            Ok(text) => JsonRpcResponse::result(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": text
                    }]
                }),
            ),
            Err(e) => {
                if e.is_validation() {
                    tracing::debug!(tool = tool_name, error = %e, "Rejected tool arguments");
                } else {
                    tracing::warn!(tool = tool_name, error = %e, "Tool call failed");
                }
                JsonRpcResponse::result(
                    id,
                    json!({
                        "content": [{
                            "type": "text",
                            "text": format!("Error: {}", e)
                        }],
                        "isError": true
                    }),
                )
            }
        }
    }

    /// Reads requests line by line until EOF or `shutdown` fires.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        shutdown: &CancellationToken,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, closing stdio loop");
                    break;
                }
            };
            let Some(line) = line else {
                tracing::debug!("stdin closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e)),
            };

            if response.should_send() {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                writer.write_all(&payload).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}
