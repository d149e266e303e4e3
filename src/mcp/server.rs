//! MCPサーバー本体（stdioトランスポート）
//!
//! 1行1メッセージのJSON-RPCを標準入力から読み、応答を標準出力に書く。
//! ログは標準エラーに出すため、標準出力にはプロトコル以外を書かない。
//! リクエストは到着順に1件ずつ処理する。

use crate::domain::article::JoomlaClient;
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::mcp::tools::ToolRegistry;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "joomla-articles-mcp";

pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(client: JoomlaClient) -> Self {
        Self {
            registry: ToolRegistry::new(client),
        }
    }

    /// 標準入出力でサーバーを実行する
    pub async fn run_stdio(&self) -> Result<()> {
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run(reader, writer).await
    }

    /// 任意の入出力でサーバーを実行する（EOFで終了）
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCPサーバーを開始しました。リクエスト待機中...");
        let mut lines = reader.lines();

        while let Some(line) = lines
            .next_line()
            .await
            .context("標準入力の読み込みに失敗")?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let response_json =
                    serde_json::to_string(&response).context("レスポンスのシリアライズに失敗")?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("EOFを受信したため終了します");
        Ok(())
    }

    /// 1行分のメッセージを処理する。通知の場合は`None`
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "JSON-RPCメッセージのパースに失敗");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        self.handle(request).await
    }

    /// リクエストを処理する。通知の場合は`None`
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "リクエスト受信");

        if request.jsonrpc != JSONRPC_VERSION {
            warn!(version = %request.jsonrpc, "jsonrpcバージョンが2.0ではありません");
        }

        if request.is_notification() {
            debug!(method = %request.method, "通知のため応答しません");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": self.registry.definitions() }),
            ),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
        };

        let tool = match self.registry.get(&params.name) {
            Some(tool) => tool,
            None => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Unknown tool: {}", params.name),
                )
            }
        };

        info!(tool = %params.name, "ツールを実行します");
        let result = match tool.execute(params.arguments).await {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "ツールの実行に失敗");
                CallToolResult::error(e.to_string())
            }
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e)),
        }
    }
}
