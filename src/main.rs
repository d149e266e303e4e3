use anyhow::{Context, Result};
use joomla_mcp::domain::article::JoomlaClient;
use joomla_mcp::infra::api::ReqwestHttpClient;
use joomla_mcp::mcp::McpServer;
use joomla_mcp::types::Config;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// ログは標準エラーへ出力する（標準出力はMCPプロトコル専用）
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(e) = run().await {
        error!("サーバーの起動または実行中にエラーが発生しました: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Arc::new(Config::from_env().context("設定の読み込みに失敗")?);
    info!(base_url = config.base_url(), timeout_secs = config.timeout_secs(), "設定を読み込みました");

    let http = ReqwestHttpClient::new(&config).context("HTTPクライアントの初期化に失敗")?;
    let client = JoomlaClient::new(Arc::new(http), config);

    McpServer::new(client).run_stdio().await
}
