/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Processes tool calls against the completion cache
/// 3. Sends JSON-RPC responses to stdout

use std::collections::HashMap;

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::cache::CompletionCache;
use crate::domain::DomainError;
use crate::mcp::protocol::*;
use crate::tools;
use crate::ServerError;

/// MCP server that exposes the completion cache as tools
pub struct McpServer {
    cache: CompletionCache,
    /// Whether the client has finished initialization
    initialized: bool,
}

/// Anything a tool returns: a text message plus its structured form
trait ToolOutput: Serialize {
    fn message(&self) -> &str;
}

macro_rules! tool_output {
    ($($ty:ty),* $(,)?) => {
        $(impl ToolOutput for $ty {
            fn message(&self) -> &str {
                &self.message
            }
        })*
    };
}

tool_output!(
    tools::StatusResponse,
    tools::ToggleResponse,
    tools::StreakResponse,
    tools::TotalsResponse,
    tools::ForgetResponse,
);

impl McpServer {
    /// Create a new MCP server
    pub fn new(cache: CompletionCache) -> Self {
        Self {
            cache,
            initialized: false,
        }
    }

    /// Whether the client has sent its initialized notification
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    ///
    /// Returns once stdin closes, after pending log saves have finished.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        self.cache.flush().await;
        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Blank lines and notifications produce no response.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.method.starts_with("notifications/") {
            self.handle_notification(&request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client finished initialization");
            }
            other => debug!("Ignoring notification {}", other),
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(request.id, json!(null))
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    /// Handle MCP initialization request
    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "Habit Completion Cache".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(request.id, &result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools = vec![
            tool_definition::<tools::StatusParams>(
                "completion_status",
                "Show a habit's status for a day (default today) with its streaks and totals",
            ),
            tool_definition::<tools::ToggleParams>(
                "completion_toggle",
                "Cycle today's status: incomplete -> completed -> skipped -> incomplete",
            ),
            tool_definition::<tools::HabitParams>(
                "completion_streak",
                "Current streak of consecutive completed days, and the streak allowing one missed day",
            ),
            tool_definition::<tools::HabitParams>(
                "completion_totals",
                "Number of completed and skipped days in the cached history",
            ),
            tool_definition::<tools::HabitParams>(
                "completion_forget",
                "Drop a habit's cached completions (e.g. after the habit was deleted)",
            ),
        ];

        JsonRpcResponse::success(request.id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let args = tool_params.arguments;
        let cache = &self.cache;

        let result = match tool_params.name.as_str() {
            "completion_status" => match parse_args(args) {
                Ok(params) => tool_result(tools::get_completion_status(cache, params).await),
                Err(e) => e,
            },
            "completion_toggle" => match parse_args(args) {
                Ok(params) => tool_result(tools::toggle_completion(cache, params).await),
                Err(e) => e,
            },
            "completion_streak" => match parse_args(args) {
                Ok(params) => tool_result(tools::get_completion_streak(cache, params).await),
                Err(e) => e,
            },
            "completion_totals" => match parse_args(args) {
                Ok(params) => tool_result(tools::get_completion_totals(cache, params).await),
                Err(e) => e,
            },
            "completion_forget" => match parse_args(args) {
                Ok(params) => tool_result(tools::forget_habit(cache, params)),
                Err(e) => e,
            },
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        to_response(request.id, &result)
    }
}

fn tool_definition<T: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let input_schema = serde_json::to_value(schema_for!(T))
        .unwrap_or_else(|_| json!({ "type": "object" }));

    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn parse_args<T: DeserializeOwned>(args: HashMap<String, Value>) -> Result<T, ToolCallResult> {
    serde_json::from_value(Value::Object(args.into_iter().collect()))
        .map_err(|e| ToolCallResult::error(format!("Invalid arguments: {}", e)))
}

fn tool_result<R: ToolOutput>(result: Result<R, DomainError>) -> ToolCallResult {
    match result {
        Ok(response) => {
            let structured = serde_json::to_value(&response).ok();
            let text = ToolCallResult::success(response.message().to_string());
            match structured {
                Some(value) => text.with_structured(value),
                None => text,
            }
        }
        Err(e) => ToolCallResult::error(e.to_string()),
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
            None,
        ),
    }
}
