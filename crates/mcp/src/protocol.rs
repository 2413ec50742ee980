// MCP protocol types (JSON-RPC 2.0 over stdio)

use crate::tools::ToolEntry;
use bexio_core::schema::Annotations;
use bexio_core::{ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision answered to `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id,
                result: Some(result),
                error: None,
            },
            Err(e) => Self::error(id, JsonRpcError::internal_error(e.to_string())),
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(Self::PARSE_ERROR, format!("Parse error: {}", detail))
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self::new(Self::INVALID_REQUEST, format!("Invalid Request: {}", detail))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }
}

// MCP-specific protocol messages

/// Tool definition for MCP
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub annotations: Annotations,
}

impl From<&ToolEntry> for ToolSchema {
    fn from(entry: &ToolEntry) -> Self {
        let definition = &entry.definition;
        Self {
            name: definition.name.to_string(),
            description: definition.description.to_string(),
            input_schema: definition.input_schema.to_json_schema(),
            annotations: definition.annotations(),
        }
    }
}

/// List tools response
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Call tool request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Call tool response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    /// Success renders the payload as pretty JSON text; failure carries the
    /// message as text and the error envelope as structured content.
    pub fn from_outcome(outcome: ToolResult<Value>) -> Self {
        match outcome {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn success(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        let structured_content = match value {
            Value::Object(_) => Some(value),
            other => Some(serde_json::json!({ "result": other })),
        };
        Self {
            content: vec![ToolContent::text(text)],
            is_error: false,
            structured_content,
        }
    }

    pub fn failure(err: &ToolError) -> Self {
        let envelope = err.envelope();
        Self {
            content: vec![ToolContent::text(envelope.message.clone())],
            is_error: true,
            structured_content: serde_json::to_value(envelope).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Initialize request params; only the version is inspected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo", default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl InitializeResult {
    pub fn current() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_has_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(request.is_notification());
        assert!(request.params.is_none());
    }

    #[test]
    fn test_failure_result_carries_envelope() {
        let result = CallToolResult::failure(&ToolError::not_found("Invoice", 42));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "Invoice with ID 42 not found");
        assert_eq!(json["structuredContent"]["kind"], "not_found");
        assert_eq!(json["structuredContent"]["id"], "42");
    }

    #[test]
    fn test_success_wraps_arrays_for_structured_content() {
        let result = CallToolResult::success(json!([{"id": 1}]));

        assert!(!result.is_error);
        assert_eq!(result.structured_content, Some(json!({"result": [{"id": 1}]})));
        assert_eq!(
            result.content[0],
            ToolContent::text("[\n  {\n    \"id\": 1\n  }\n]")
        );
    }

    #[test]
    fn test_error_response_omits_result() {
        let response = JsonRpcResponse::error(json!(7), JsonRpcError::method_not_found("resources/list"));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["error"]["code"], -32601);
        assert!(json.get("result").is_none());
    }
}
