//! MCP stdio server loop
//!
//! Speaks newline-delimited JSON-RPC over a reader/writer pair
//! (stdin/stdout in production). Each tools/call runs in its own task
//! so one call waiting out a rate limit never stalls the read loop or
//! other calls; all outbound traffic funnels through a single writer
//! task to keep messages whole.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use finnhub_mcp_core::{FinnhubService, ProgressSink};

use crate::protocol::{
    InitializeResult, LogLevel, LogMessageParams, McpNotification, McpRequest, McpResponse,
    ProgressParams, RequestId, RpcError, ServerCapabilities, ServerInfo, SetLevelParams,
    ToolCallParams, ToolsListResult, PROTOCOL_VERSION,
};
use crate::tools;

/// Server name advertised during initialize and used as the logger id.
pub const SERVER_NAME: &str = "mcp-finnhub";

/// Sends notifications to the connected client over the shared writer
/// channel, honoring the minimum level set via logging/setLevel.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<String>,
    min_level: Arc<Mutex<LogLevel>>,
}

impl Notifier {
    pub(crate) fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            tx,
            min_level: Arc::new(Mutex::new(LogLevel::Info)),
        }
    }

    fn min_level(&self) -> LogLevel {
        *self.min_level.lock().unwrap_or_else(|poisoned| {
            warn!("Log level mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn set_min_level(&self, level: LogLevel) {
        let mut guard = self.min_level.lock().unwrap_or_else(|poisoned| {
            warn!("Log level mutex was poisoned, recovering");
            poisoned.into_inner()
        });
        *guard = level;
    }

    /// Send a notifications/message entry if it clears the level gate.
    /// Delivery is best-effort; a closed connection drops the message.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if level < self.min_level() {
            return;
        }
        let params = LogMessageParams {
            level: level.as_str(),
            logger: SERVER_NAME,
            data: Value::String(message.into()),
        };
        match serde_json::to_value(&params) {
            Ok(params) => self.send(McpNotification::new("notifications/message", params)),
            Err(e) => error!("Failed to serialize log notification: {e}"),
        }
    }

    /// Send a notifications/progress entry. Progress is not level gated;
    /// the client asked for it by supplying a token.
    pub fn progress(&self, token: &Value, progress: u32, total: u32, message: &str) {
        let params = ProgressParams {
            progress_token: token.clone(),
            progress,
            total,
            message: message.to_string(),
        };
        match serde_json::to_value(&params) {
            Ok(params) => self.send(McpNotification::new("notifications/progress", params)),
            Err(e) => error!("Failed to serialize progress notification: {e}"),
        }
    }

    fn send(&self, notification: McpNotification) {
        send_json(&self.tx, &notification);
    }
}

/// Bridges retry progress reports onto notifications/progress for one
/// tool call.
struct McpProgressSink {
    notifier: Notifier,
    token: Value,
}

#[async_trait]
impl ProgressSink for McpProgressSink {
    async fn report_progress(&self, progress: u32, total: u32, message: &str) {
        self.notifier.progress(&self.token, progress, total, message);
    }
}

/// MCP server over newline-delimited JSON-RPC.
pub struct McpServer {
    service: Arc<FinnhubService>,
}

impl McpServer {
    pub fn new(service: FinnhubService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Serve one MCP session until the reader reaches EOF.
    ///
    /// The writer task drains every in-flight response before this
    /// returns, so calls spawned late still get answered.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_loop(writer, rx));
        let notifier = Notifier::new(tx.clone());

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.handle_message(line, &tx, &notifier);
        }

        info!("Input stream closed, shutting down");

        // Release our senders; the writer exits once spawned calls finish.
        drop(notifier);
        drop(tx);
        writer_task.await??;

        Ok(())
    }

    fn handle_message(&self, line: &str, tx: &mpsc::UnboundedSender<String>, notifier: &Notifier) {
        let request: McpRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Discarding malformed message: {e}");
                send_json(
                    tx,
                    &McpResponse::failure(None, RpcError::parse_error(format!("Invalid JSON: {e}"))),
                );
                return;
            }
        };

        let Some(id) = request.id else {
            handle_notification(&request.method);
            return;
        };

        match request.method.as_str() {
            "initialize" => {
                let client_name = request
                    .params
                    .as_ref()
                    .and_then(|params| params.get("clientInfo"))
                    .and_then(|info| info.get("name"))
                    .and_then(|name| name.as_str())
                    .unwrap_or("unknown");
                info!("Initializing MCP session for client '{}'", client_name);

                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION,
                    capabilities: ServerCapabilities::default(),
                    server_info: ServerInfo {
                        name: SERVER_NAME,
                        version: env!("CARGO_PKG_VERSION"),
                    },
                };
                respond(tx, id, &result);
            }
            "ping" => {
                send_json(tx, &McpResponse::success(Some(id), Value::Object(Default::default())));
            }
            "tools/list" => {
                respond(
                    tx,
                    id,
                    &ToolsListResult {
                        tools: tools::tool_definitions(),
                    },
                );
            }
            "logging/setLevel" => {
                let params = request
                    .params
                    .ok_or_else(|| "missing params".to_string())
                    .and_then(|params| {
                        serde_json::from_value::<SetLevelParams>(params).map_err(|e| e.to_string())
                    });
                match params {
                    Ok(params) => match LogLevel::parse(&params.level) {
                        Some(level) => {
                            debug!("Minimum client log level set to {}", params.level);
                            notifier.set_min_level(level);
                            send_json(
                                tx,
                                &McpResponse::success(Some(id), Value::Object(Default::default())),
                            );
                        }
                        None => send_json(
                            tx,
                            &McpResponse::failure(
                                Some(id),
                                RpcError::invalid_params(format!(
                                    "Unknown log level: {}",
                                    params.level
                                )),
                            ),
                        ),
                    },
                    Err(e) => send_json(
                        tx,
                        &McpResponse::failure(
                            Some(id),
                            RpcError::invalid_params(format!("Invalid params: {e}")),
                        ),
                    ),
                }
            }
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<ToolCallParams>(params) {
                    Ok(params) => self.spawn_tool_call(id, params, tx, notifier),
                    Err(e) => send_json(
                        tx,
                        &McpResponse::failure(
                            Some(id),
                            RpcError::invalid_params(format!("Invalid params: {e}")),
                        ),
                    ),
                }
            }
            other => {
                send_json(
                    tx,
                    &McpResponse::failure(Some(id), RpcError::method_not_found(other)),
                );
            }
        }
    }

    /// Run one tool call as its own task so slow calls do not block the
    /// read loop.
    fn spawn_tool_call(
        &self,
        id: RequestId,
        params: ToolCallParams,
        tx: &mpsc::UnboundedSender<String>,
        notifier: &Notifier,
    ) {
        let service = Arc::clone(&self.service);
        let notifier = notifier.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let token = params.meta.and_then(|meta| meta.progress_token);
            let sink = token.map(|token| McpProgressSink {
                notifier: notifier.clone(),
                token,
            });

            let outcome = tools::dispatch_tool(
                &service,
                &params.name,
                params.arguments,
                &notifier,
                sink.as_ref().map(|sink| sink as &dyn ProgressSink),
            )
            .await;

            let response = match outcome {
                Ok(result) => match serde_json::to_value(&result) {
                    Ok(value) => McpResponse::success(Some(id), value),
                    Err(e) => McpResponse::failure(
                        Some(id),
                        RpcError::internal_error(format!("Failed to serialize tool result: {e}")),
                    ),
                },
                Err(error) => McpResponse::failure(Some(id), error),
            };
            send_json(&tx, &response);
        });
    }
}

fn handle_notification(method: &str) {
    match method {
        "notifications/initialized" => debug!("Client completed initialization"),
        "notifications/cancelled" => {
            debug!("Ignoring cancellation; in-flight calls run to completion")
        }
        other => debug!("Ignoring notification: {}", other),
    }
}

/// Serialize a success payload, downgrading serializer failures to a
/// JSON-RPC internal error.
fn respond<T: Serialize>(tx: &mpsc::UnboundedSender<String>, id: RequestId, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => send_json(tx, &McpResponse::success(Some(id), value)),
        Err(e) => send_json(
            tx,
            &McpResponse::failure(
                Some(id),
                RpcError::internal_error(format!("Failed to serialize response: {e}")),
            ),
        ),
    }
}

/// Best-effort enqueue onto the writer task.
fn send_json<T: Serialize>(tx: &mpsc::UnboundedSender<String>, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if tx.send(json).is_err() {
                debug!("Connection closed; dropping outbound message");
            }
        }
        Err(e) => error!("Failed to serialize outbound message: {e}"),
    }
}

/// Single writer: one message per line, flushed immediately.
async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        writer.write_all(message.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notifier_honors_min_level() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(tx);

        notifier.log(LogLevel::Debug, "hidden");
        assert!(rx.try_recv().is_err());

        notifier.log(LogLevel::Info, "visible");
        let message = rx.try_recv().unwrap();
        assert!(message.contains("notifications/message"));
        assert!(message.contains("visible"));

        notifier.set_min_level(LogLevel::Error);
        notifier.log(LogLevel::Warning, "suppressed");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_progress_is_not_level_gated() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(tx);
        notifier.set_min_level(LogLevel::Emergency);

        notifier.progress(&json!(7), 0, 3, "waiting");
        let message = rx.try_recv().unwrap();
        assert!(message.contains("notifications/progress"));
        assert!(message.contains("\"progressToken\":7"));
    }

    #[test]
    fn test_notifier_survives_closed_connection() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let notifier = Notifier::new(tx);

        // Must not panic; delivery is best-effort.
        notifier.log(LogLevel::Info, "going nowhere");
        notifier.progress(&json!("tok"), 1, 3, "still nowhere");
    }
}
