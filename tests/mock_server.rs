//! Joomla REST API モックサーバー
//!
//! このモジュールはhttpmockを使用してJoomlaのREST APIをモックし、
//! 実際のreqwestクライアントを通した統合テストを、外部通信を完全に
//! 遮断した環境で実行します。

use httpmock::prelude::*;
use httpmock::{Method::PATCH, Mock};
use joomla_mcp::domain::article::{
    self, CreateArticleParams, DeleteArticleParams, JoomlaClient, ManageArticleStateParams,
};
use joomla_mcp::infra::api::ReqwestHttpClient;
use joomla_mcp::mcp::McpServer;
use joomla_mcp::types::{Config, ToolError};
use serde_json::{json, Value};
use std::sync::Arc;

const TOKEN: &str = "test-token";
const ARTICLES_PATH: &str = "/api/index.php/v1/content/articles";
const CATEGORIES_PATH: &str = "/api/index.php/v1/content/categories";

/// Joomla APIのモックサーバー
pub struct JoomlaMockServer {
    server: MockServer,
}

impl JoomlaMockServer {
    pub fn start() -> Self {
        Self {
            server: MockServer::start(),
        }
    }

    /// モックサーバーに向けた実クライアントを作成
    pub fn client(&self) -> JoomlaClient {
        let config = Arc::new(Config::new(self.server.url(""), TOKEN, 5).unwrap());
        let http = ReqwestHttpClient::new(&config).unwrap();
        JoomlaClient::new(Arc::new(http), config)
    }

    fn article_path(id: u64) -> String {
        format!("{}/{}", ARTICLES_PATH, id)
    }

    /// カテゴリ一覧をモック（認証ヘッダ必須）
    pub fn mock_categories(&self, categories: &[(u64, &str)]) -> Mock<'_> {
        let data: Vec<Value> = categories
            .iter()
            .map(|(id, title)| {
                json!({"type": "categories", "id": id.to_string(),
                    "attributes": {"id": id, "title": title}})
            })
            .collect();
        self.server.mock(|when, then| {
            when.method(GET)
                .path(CATEGORIES_PATH)
                .header("authorization", format!("Bearer {}", TOKEN))
                .header("accept", "application/vnd.api+json");
            then.status(200)
                .header("content-type", "application/vnd.api+json")
                .json_body(json!({ "data": data }));
        })
    }

    /// 記事一覧をモック
    pub fn mock_articles(&self, articles: &[(u64, &str, i64)]) -> Mock<'_> {
        let data: Vec<Value> = articles
            .iter()
            .map(|(id, title, state)| {
                json!({"type": "articles", "id": id.to_string(),
                    "attributes": {"id": id, "title": title, "state": state}})
            })
            .collect();
        self.server.mock(|when, then| {
            when.method(GET).path(ARTICLES_PATH);
            then.status(200).json_body(json!({ "data": data }));
        })
    }

    /// 個別記事の取得をモック
    pub fn mock_get_article(&self, id: u64, title: &str, state: i64) -> Mock<'_> {
        let path = Self::article_path(id);
        self.server.mock(|when, then| {
            when.method(GET)
                .path(path)
                .header("authorization", format!("Bearer {}", TOKEN));
            then.status(200).json_body(json!({
                "data": {"type": "articles", "id": id.to_string(),
                    "attributes": {"id": id, "title": title, "state": state, "catid": 2}}
            }));
        })
    }

    /// 存在しない記事へのリクエスト（任意メソッド）をモック
    pub fn mock_article_missing(&self, id: u64) -> Mock<'_> {
        let path = Self::article_path(id);
        self.server.mock(|when, then| {
            when.path(path);
            then.status(404).json_body(json!({
                "errors": [{"title": "Resource not found", "code": 404}]
            }));
        })
    }

    /// 状態変更のPATCHをモック（本文が完全一致した場合のみ）
    pub fn mock_patch_state(&self, id: u64, state: i64) -> Mock<'_> {
        let path = Self::article_path(id);
        self.server.mock(|when, then| {
            when.method(PATCH)
                .path(path)
                .header("content-type", "application/json")
                .json_body(json!({ "state": state }));
            then.status(200).json_body(json!({
                "data": {"type": "articles", "id": id.to_string(),
                    "attributes": {"id": id, "state": state}}
            }));
        })
    }

    /// 記事のDELETEをモック
    pub fn mock_delete(&self, id: u64) -> Mock<'_> {
        let path = Self::article_path(id);
        self.server.mock(|when, then| {
            when.method(DELETE).path(path);
            then.status(204);
        })
    }

    /// 記事作成のPOSTをモック（本文の部分一致）
    pub fn mock_create(&self, expected_partial: Value, created_id: u64) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.method(POST)
                .path(ARTICLES_PATH)
                .header("content-type", "application/json")
                .json_body_partial(expected_partial.to_string());
            then.status(200).json_body(json!({
                "data": {"type": "articles", "id": created_id.to_string(),
                    "attributes": {"id": created_id, "title": "created", "state": 1}}
            }));
        })
    }

    /// 任意パスへのエラーレスポンスをモック
    pub fn mock_error(&self, path: &str, status: u16, title: &str) -> Mock<'_> {
        self.server.mock(|when, then| {
            when.path(path);
            then.status(status).json_body(json!({
                "errors": [{"title": title, "code": status}]
            }));
        })
    }
}

#[tokio::test]
async fn test_create_article_end_to_end() {
    let mock_server = JoomlaMockServer::start();
    let categories = mock_server.mock_categories(&[(2, "Uncategorised"), (8, "Blog")]);
    let create = mock_server.mock_create(
        json!({
            "title": "Hello world.",
            "alias": "hello-world",
            "articletext": "<p>Hello world.</p>\n<p>Second paragraph.</p>",
            "catid": 8,
            "state": 1
        }),
        21,
    );

    let params = CreateArticleParams {
        article_text: "Hello world.\n\nSecond paragraph.".to_string(),
        title: None,
        category_id: Some(8),
        convert_plain_text: true,
        published: true,
        metadesc: None,
    };
    let message = article::create_article(&mock_server.client(), &params)
        .await
        .unwrap();

    assert_eq!(
        message,
        "Successfully created published article 'Hello world.' (ID: 21) in category ID 8."
    );
    categories.assert();
    create.assert();
}

#[tokio::test]
async fn test_manage_state_published_to_archived() {
    let mock_server = JoomlaMockServer::start();
    let get = mock_server.mock_get_article(5, "Launch", 1);
    let patch = mock_server.mock_patch_state(5, 2);

    let params = ManageArticleStateParams {
        article_id: 5,
        target_state: 2,
    };
    let message = article::manage_article_state(&mock_server.client(), &params)
        .await
        .unwrap();

    assert_eq!(
        message,
        "Updated article 'Launch' (ID: 5): published → archived."
    );
    get.assert();
    patch.assert();
}

#[tokio::test]
async fn test_manage_state_invalid_value_makes_no_request() {
    let mock_server = JoomlaMockServer::start();
    let get = mock_server.mock_get_article(5, "Launch", 1);

    let params = ManageArticleStateParams {
        article_id: 5,
        target_state: 3,
    };
    let error = article::manage_article_state(&mock_server.client(), &params)
        .await
        .unwrap_err();

    assert!(error.is_validation());
    get.assert_hits(0);
}

#[tokio::test]
async fn test_delete_missing_article_is_not_found() {
    let mock_server = JoomlaMockServer::start();
    let missing = mock_server.mock_article_missing(404);

    let error = article::delete_article(&mock_server.client(), &DeleteArticleParams { article_id: 404 })
        .await
        .unwrap_err();

    assert!(matches!(error, ToolError::NotFound { article_id: 404 }));
    assert_eq!(error.to_string(), "Article 404 was not found.");
    // 存在確認のGETだけで止まる
    missing.assert_hits(1);
}

#[tokio::test]
async fn test_delete_trashes_then_deletes() {
    let mock_server = JoomlaMockServer::start();
    let get = mock_server.mock_get_article(12, "Old news", 0);
    let trash = mock_server.mock_patch_state(12, -2);
    let delete = mock_server.mock_delete(12);

    let message = article::delete_article(&mock_server.client(), &DeleteArticleParams { article_id: 12 })
        .await
        .unwrap();

    assert_eq!(message, "Successfully deleted article 'Old news' (ID: 12).");
    get.assert();
    trash.assert();
    delete.assert();
}

#[tokio::test]
async fn test_remote_error_detail_is_surfaced() {
    let mock_server = JoomlaMockServer::start();
    mock_server.mock_error(ARTICLES_PATH, 401, "Forbidden");

    let error = article::list_articles(&mock_server.client()).await.unwrap_err();
    assert_eq!(error.to_string(), "Joomla API returned HTTP 401: Forbidden");
}

#[tokio::test]
async fn test_transport_error_when_unreachable() {
    // ポート1には何も待ち受けていない
    let config = Arc::new(Config::new("http://127.0.0.1:1", TOKEN, 2).unwrap());
    let http = ReqwestHttpClient::new(&config).unwrap();
    let client = JoomlaClient::new(Arc::new(http), config);

    let error = article::list_categories(&client).await.unwrap_err();
    assert!(matches!(error, ToolError::Transport { .. }));
    assert!(error.to_string().starts_with("Could not reach the Joomla API"));
}

#[tokio::test]
async fn test_mcp_session_over_stdio_buffers() {
    let mock_server = JoomlaMockServer::start();
    let articles = mock_server.mock_articles(&[(1, "Welcome", 1), (2, "Draft", 0)]);
    let server = McpServer::new(mock_server.client());

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "get_joomla_articles", "arguments": {}}}),
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "update_article",
                "arguments": {"article_id": 1, "introtext": "Only the teaser"}}}),
    ]
    .iter()
    .map(|message| message.to_string())
    .collect::<Vec<_>>()
    .join("\n");

    let mut output: Vec<u8> = Vec::new();
    server.run(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 6);

    assert_eq!(responses[2]["result"]["isError"], json!(false));
    assert_eq!(
        responses[2]["result"]["content"][0]["text"],
        json!("Articles:\n- ID: 1, Title: Welcome, State: published\n- ID: 2, Title: Draft, State: unpublished\n")
    );

    // fulltextが欠けた更新は拒否され、CMSへは送られない
    assert_eq!(responses[3]["result"]["isError"], json!(true));
    let text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("fulltext"), "{}", text);

    articles.assert();
}
