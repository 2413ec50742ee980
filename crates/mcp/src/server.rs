// MCP server: newline-delimited JSON-RPC 2.0 over stdin/stdout

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolSchema,
};
use crate::tools::Dispatcher;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Responses waiting for the writer.
const OUTBOX_CAPACITY: usize = 256;

/// Longest accepted request line; uploads carry base64 content inline.
const MAX_LINE_BYTES: usize = 32 * 1024 * 1024;

pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Each request runs in its own task; responses are written by a single
    /// writer in completion order, one JSON document per line.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
        let writer_task = tokio::spawn(write_responses(writer, rx));

        info!(tools = self.dispatcher.registry().len(), "MCP server started");

        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line.trim().to_string(),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(max_bytes = MAX_LINE_BYTES, "Request line too long, skipped");
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::invalid_request("request line too long"),
                    );
                    if let Ok(encoded) = serde_json::to_string(&response) {
                        let _ = tx.send(encoded).await;
                    }
                    continue;
                }
                Err(LinesCodecError::Io(e)) => return Err(e).context("Failed to read request"),
            };
            if line.is_empty() {
                continue;
            }

            let dispatcher = self.dispatcher.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some(response) = handle_message(&dispatcher, &line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(encoded) => {
                        if tx.send(encoded).await.is_err() {
                            warn!("Response dropped, writer has stopped");
                        }
                    }
                    Err(e) => error!(error = %e, "Failed to encode response"),
                }
            });
        }

        // In-flight requests keep their senders; the writer drains until the last one finishes.
        drop(tx);
        writer_task.await.context("Response writer panicked")??;

        info!("MCP server stopped");
        Ok(())
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    Ok(())
}

/// Handle one line of input. Notifications produce no response.
pub async fn handle_message(dispatcher: &Dispatcher, line: &str) -> Option<JsonRpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Unparsable request line");
            return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)));
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(raw.clone()) {
        Ok(request) => request,
        Err(e) => {
            let id = raw.get("id").cloned().unwrap_or(Value::Null);
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(e)));
        }
    };

    let Some(id) = request.id.clone() else {
        debug!(method = %request.method, "Notification received");
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => {
            let params: InitializeParams = request
                .params
                .and_then(|p| serde_json::from_value(p).ok())
                .unwrap_or_default();
            info!(
                client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
                protocol_version = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "Client initializing"
            );
            JsonRpcResponse::success(id, InitializeResult::current())
        }
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => {
            let tools = dispatcher
                .registry()
                .entries()
                .iter()
                .map(ToolSchema::from)
                .collect();
            JsonRpcResponse::success(id, ListToolsResult { tools })
        }
        "tools/call" => {
            let params: CallToolParams = match request.params.map(serde_json::from_value) {
                Some(Ok(params)) => params,
                Some(Err(e)) => {
                    return Some(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                    ))
                }
                None => {
                    return Some(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params("Missing tools/call params"),
                    ))
                }
            };
            let outcome = dispatcher
                .dispatch(&params.name, params.arguments.as_ref())
                .await;
            JsonRpcResponse::success(id, CallToolResult::from_outcome(outcome))
        }
        other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use crate::tools::registry;
    use bexio_core::Resource;
    use tokio::io::AsyncReadExt;

    fn dispatcher(api: MockApi) -> Dispatcher {
        Dispatcher::new(registry().unwrap(), Arc::new(api))
    }

    async fn handle(line: &str) -> Value {
        let response = handle_message(&dispatcher(MockApi::new()), line)
            .await
            .unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"test"}}}"#,
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "bexio-mcp");
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = handle("{not json").await;

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handle(r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#).await;

        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_tools_call_without_name() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"arguments":{}}}"#,
        )
        .await;

        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let response = handle_message(
            &dispatcher(MockApi::new()),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_reports_annotations() {
        let response = handle(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools[0]["name"], "list_contacts");
        let delete = tools
            .iter()
            .find(|t| t["name"] == "delete_invoice")
            .unwrap();
        assert_eq!(delete["annotations"]["destructiveHint"], true);
        assert_eq!(delete["annotations"]["readOnlyHint"], false);
        assert_eq!(delete["inputSchema"]["required"], json!(["invoice_id"]));
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result_not_a_protocol_error() {
        let response = handle(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"get_invoice","arguments":{"invoice_id":0}}}"#,
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(response["result"]["structuredContent"]["kind"], "validation");
        assert_eq!(
            response["result"]["structuredContent"]["violations"][0]["field_path"],
            "invoice_id"
        );
    }

    #[tokio::test]
    async fn test_serve_answers_every_request() {
        let api = MockApi::new().with_records(
            Resource::Contacts,
            vec![json!({"id": 1, "name_1": "Muster AG"})],
        );
        let server = McpServer::new(dispatcher(api));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get_contact","arguments":{"contact_id":1}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n",
        );
        let (client, server_side) = tokio::io::duplex(1 << 16);

        let serve = server.serve(input.as_bytes(), server_side);
        let read = async move {
            let mut client = client;
            let mut output = String::new();
            client.read_to_string(&mut output).await.unwrap();
            output
        };
        let (served, output) = tokio::join!(serve, read);
        served.unwrap();

        let mut responses: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        responses.sort_by_key(|r| r["id"].as_u64());

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[1]["result"]["isError"], false);
        assert_eq!(
            responses[1]["result"]["structuredContent"]["name_1"],
            "Muster AG"
        );
        assert_eq!(responses[2]["result"], json!({}));
    }
}
