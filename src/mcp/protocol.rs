/// Wire types for the completion server's JSON-RPC 2.0 / MCP traffic
///
/// Requests are only ever deserialized and responses only ever serialized,
/// so each type derives just the direction it travels in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const MCP_VERSION: &str = "2024-11-05";

const JSONRPC_VERSION: &str = "2.0";

/// One incoming line
///
/// Notifications carry no `id`; it deserializes as `null` for them.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    pub params: Option<Value>,
}

/// Reply to a request; exactly one of `result` and `error` is set
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `params` of a `tools/call` request
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    /// Missing arguments behave like an empty object
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

/// `result` of a `tools/call` request
///
/// Tool failures (bad habit id, bad date) are reported here with `is_error`
/// set rather than as JSON-RPC errors, so the client can show the text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Entry of the `tools/list` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema generated from the tool's params struct
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// The tool set is fixed, so `list_changed` is always false
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

/// `result` of the `initialize` handshake
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Standard JSON-RPC codes used by the server
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message, data }),
        }
    }
}

impl ToolCallResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            structured_content: None,
            is_error,
        }
    }

    /// Plain-text success; attach the response object with `with_structured`
    pub fn success(text: String) -> Self {
        Self::text(text, false)
    }

    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured_content = Some(value);
        self
    }

    pub fn error(error_message: String) -> Self {
        Self::text(format!("Error: {}", error_message), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_uses_camel_case() {
        let value = serde_json::to_value(ToolCallResult::error("boom".to_string())).unwrap();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["type"], json!("text"));
        assert_eq!(value["content"][0]["text"], json!("Error: boom"));
        assert!(value.get("structuredContent").is_none());
    }

    #[test]
    fn test_request_without_id_is_a_notification() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.id.is_null());
        assert!(request.params.is_none());
    }

    #[test]
    fn test_success_response_omits_error() {
        let value = serde_json::to_value(JsonRpcResponse::success(json!(7), json!({}))).unwrap();
        assert_eq!(value["jsonrpc"], json!("2.0"));
        assert!(value.get("error").is_none());
    }
}
