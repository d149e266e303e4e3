use crate::types::{Config, ConfigError, ConfigResult, ToolError, ToolResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Joomla JSON:APIのメディアタイプ
const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// CMSに送るHTTPリクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get<U: Into<String>>(url: U) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }

    pub fn post<U: Into<String>>(url: U, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
        }
    }

    pub fn patch<U: Into<String>>(url: U, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            url: url.into(),
            body: Some(body),
        }
    }

    pub fn delete<U: Into<String>>(url: U) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: None,
        }
    }
}

/// CMSから受け取ったHTTPレスポンス（ステータスと本文のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new<B: Into<String>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xxかどうか
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
/// 非2xxステータスはエラーにせず`ApiResponse`として返し、
/// 通信自体の失敗のみ`ToolError::Transport`とする。
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ToolResult<ApiResponse>;
}

/// `reqwest` を使用した本番用のHTTPクライアント実装
///
/// 全リクエストにBearerトークンとJSON:APIのヘッダを付与する。
pub struct ReqwestHttpClient {
    client: Client,
    bearer_token: String,
    user_agent: String,
}

impl ReqwestHttpClient {
    /// 設定からHTTPクライアントを作成
    ///
    /// 構築の失敗は通信エラーではなく起動時の設定エラーとして返す。
    pub fn new(config: &Config) -> ConfigResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(client_setup_error)?;

        Ok(Self {
            client,
            bearer_token: config.bearer_token().to_string(),
            user_agent: format!("JoomlaArticlesMCP/{}", env!("CARGO_PKG_VERSION")),
        })
    }
}

fn client_setup_error(error: reqwest::Error) -> ConfigError {
    ConfigError::invalid_value(format!("could not build HTTP client: {}", error))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: ApiRequest) -> ToolResult<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "Joomla APIへリクエスト送信");

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str())
            .bearer_auth(&self.bearer_token)
            .header(ACCEPT, JSON_API_MEDIA_TYPE)
            .header(USER_AGENT, self.user_agent.as_str());

        // json()がContent-Type: application/jsonを付与する
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ToolError::transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ToolError::transport)?;

        debug!(status, bytes = body.len(), "Joomla APIからレスポンス受信");
        Ok(ApiResponse { status, body })
    }
}

/// テスト用のモックHTTPクライアント
///
/// この実装はテスト時にDIされ、実際のHTTPリクエストを行わずに
/// 登録順にレスポンスを返します。送信されたリクエストは記録され、
/// 後から検証できます。
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次に返すレスポンスを追加（ビルダー形式）
    pub fn with_response<B: Into<String>>(self, status: u16, body: B) -> Self {
        self.push_response(status, body);
        self
    }

    /// 次に返すレスポンスを追加
    pub fn push_response<B: Into<String>>(&self, status: u16, body: B) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(ApiResponse::new(status, body));
        }
    }

    /// これまでに送信されたリクエストの一覧
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: ApiRequest) -> ToolResult<ApiResponse> {
        let description = format!("{} {}", request.method, request.url);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front());
        next.ok_or_else(|| ToolError::unexpected(description, "no mock response queued"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_http_client_returns_in_order() {
        let mock_client = MockHttpClient::new()
            .with_response(200, r#"{"data":[]}"#)
            .with_response(404, "not found");

        let first = mock_client
            .send(ApiRequest::get("https://example.com/a"))
            .await
            .unwrap();
        assert!(first.is_success());
        assert_eq!(first.body, r#"{"data":[]}"#);

        let second = mock_client
            .send(ApiRequest::delete("https://example.com/b"))
            .await
            .unwrap();
        assert!(!second.is_success());
        assert_eq!(second.status, 404);

        let requests = mock_client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].url, "https://example.com/b");
    }

    #[tokio::test]
    async fn test_mock_http_client_without_response() {
        let mock_client = MockHttpClient::new();
        let result = mock_client
            .send(ApiRequest::patch("https://example.com/x", json!({"state": 1})))
            .await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("no mock response"));
        // 失敗してもリクエストは記録される
        assert_eq!(mock_client.requests()[0].body, Some(json!({"state": 1})));
    }

    #[test]
    fn test_api_response_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(301, "").is_success());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn test_client_setup_error_is_config_error() {
        // reqwestのビルダーエラーを用意する
        let builder_error = Client::new().get("not a url").build().unwrap_err();

        let error = client_setup_error(builder_error);
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        let message = error.to_string();
        assert!(message.contains("could not build HTTP client"), "{}", message);
        assert!(!message.contains("Could not reach"));
    }

    #[test]
    fn test_reqwest_client_from_config() {
        let config = Config::new("https://cms.example.com", "token", 5).unwrap();
        assert!(ReqwestHttpClient::new(&config).is_ok());
    }

    /// 軽量オンラインテスト - 実際のJoomlaサイトでの基本接続確認
    #[cfg(feature = "online")]
    #[tokio::test]
    async fn test_http_online_basic() -> Result<(), anyhow::Error> {
        let _ = dotenvy::dotenv();
        let config = match Config::from_env() {
            Ok(config) => config,
            Err(e) => {
                println!("⚠️ 設定が不足しているためスキップ: {}", e);
                return Ok(());
            }
        };

        let client = ReqwestHttpClient::new(&config)?;
        match client.send(ApiRequest::get(config.categories_url())).await {
            Ok(response) => {
                assert!(response.is_success(), "カテゴリ取得が失敗: {}", response.status);
                println!("✅ HTTP軽量オンラインテスト成功: {}文字取得", response.body.len());
            }
            Err(e) => {
                println!("⚠️ HTTPリクエストが失敗: {}", e);
                println!("ネットワーク接続を確認してください");
            }
        }

        Ok(())
    }
}
