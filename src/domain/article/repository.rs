use super::model::{Article, ArticleState, Category};
use crate::infra::api::http::{ApiRequest, ApiResponse, HttpClient};
use crate::types::{Config, ToolError, ToolResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// 属性が欠けているリソース用
static NULL: Value = Value::Null;

// 記事作成時にPOSTする本文（Joomla APIのフィールド名と一致）
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewArticle {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub articletext: String,
    pub catid: u64,
    pub language: String,
    pub metadesc: String,
    pub metakey: String,
    pub state: ArticleState,
}

// 記事更新時にPATCHする本文（指定されたフィールドのみ送信）
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introtext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulltext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadesc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ArticleState>,
}

impl ArticlePatch {
    /// 状態のみを変更するパッチ
    pub fn state(state: ArticleState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }
}

/// Joomla REST APIへのアクセスを提供するリポジトリ
///
/// HTTPクライアントはトレイトオブジェクトで受け取るため、
/// テスト時にはモッククライアントを注入できる。
/// 状態は持たず、毎回CMSから取得する。
#[derive(Clone)]
pub struct JoomlaClient {
    http: Arc<dyn HttpClient>,
    config: Arc<Config>,
}

impl JoomlaClient {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// 記事一覧を取得する
    pub async fn list_articles(&self) -> ToolResult<Vec<Article>> {
        let response = self
            .send_checked(ApiRequest::get(self.config.articles_url()))
            .await?;
        let document = parse_document(&response, "articles")?;
        collection(&document, "articles")?
            .iter()
            .map(|item| parse_article(item, "articles"))
            .collect()
    }

    /// カテゴリ一覧を取得する
    pub async fn list_categories(&self) -> ToolResult<Vec<Category>> {
        let response = self
            .send_checked(ApiRequest::get(self.config.categories_url()))
            .await?;
        let document = parse_document(&response, "categories")?;
        collection(&document, "categories")?
            .iter()
            .map(|item| parse_category(item, "categories"))
            .collect()
    }

    /// 記事を1件取得する（存在しない場合は`NotFound`）
    pub async fn get_article(&self, article_id: u64) -> ToolResult<Article> {
        let response = self
            .send_for_article(ApiRequest::get(self.config.article_url(article_id)), article_id)
            .await?;
        let document = parse_document(&response, "article")?;
        let data = document
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| ToolError::unexpected("article", "missing 'data' object"))?;
        parse_article(data, "article")
    }

    /// 記事を作成し、作成された記事を返す
    pub async fn create_article(&self, article: &NewArticle) -> ToolResult<Article> {
        let body = serde_json::to_value(article)
            .map_err(|e| ToolError::unexpected("create article", e.to_string()))?;
        let response = self
            .send_checked(ApiRequest::post(self.config.articles_url(), body))
            .await?;
        let document = parse_document(&response, "created article")?;
        let data = document
            .get("data")
            .ok_or_else(|| ToolError::unexpected("created article", "missing 'data' object"))?;
        parse_article(data, "created article")
    }

    /// 記事の一部フィールドを更新する
    pub async fn patch_article(&self, article_id: u64, patch: &ArticlePatch) -> ToolResult<()> {
        let body = serde_json::to_value(patch)
            .map_err(|e| ToolError::unexpected("update article", e.to_string()))?;
        self.send_for_article(
            ApiRequest::patch(self.config.article_url(article_id), body),
            article_id,
        )
        .await?;
        Ok(())
    }

    /// 記事を削除する（Joomlaではゴミ箱状態の記事のみ削除可能）
    pub async fn delete_article(&self, article_id: u64) -> ToolResult<()> {
        self.send_for_article(ApiRequest::delete(self.config.article_url(article_id)), article_id)
            .await?;
        Ok(())
    }

    /// 送信して非2xxをエラーに変換する
    async fn send_checked(&self, request: ApiRequest) -> ToolResult<ApiResponse> {
        let description = format!("{} {}", request.method, request.url);
        let response = self.http.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            warn!(status = response.status, request = %description, "Joomla APIがエラーを返しました");
            Err(ToolError::remote(response.status, &response.body))
        }
    }

    /// 個別記事へのリクエスト。404は`NotFound`にする
    async fn send_for_article(
        &self,
        request: ApiRequest,
        article_id: u64,
    ) -> ToolResult<ApiResponse> {
        match self.send_checked(request).await {
            Err(ToolError::Remote { status: 404, .. }) => Err(ToolError::not_found(article_id)),
            other => other,
        }
    }
}

/// JSON:APIドキュメントをパースする
fn parse_document(response: &ApiResponse, context: &str) -> ToolResult<Value> {
    serde_json::from_str(&response.body)
        .map_err(|e| ToolError::unexpected(context, format!("invalid JSON: {}", e)))
}

/// `data`配列を取り出す
fn collection<'a>(document: &'a Value, context: &str) -> ToolResult<&'a Vec<Value>> {
    match document.get("data") {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ToolError::unexpected(
            context,
            format!("expected a list in 'data', got {}", json_type_name(other)),
        )),
        None => Err(ToolError::unexpected(context, "missing 'data' list")),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 数値または数字文字列を整数として読む（Joomlaは両方を返すことがある）
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// リソースのIDを取得する（`attributes.id`を優先し、なければリソースの`id`）
fn resource_id(item: &Value, context: &str) -> ToolResult<u64> {
    let attributes = item.get("attributes").unwrap_or(&NULL);
    attributes
        .get("id")
        .and_then(as_i64)
        .or_else(|| item.get("id").and_then(as_i64))
        .and_then(|id| u64::try_from(id).ok())
        .ok_or_else(|| ToolError::unexpected(context, "resource without a numeric id"))
}

fn attribute_title(item: &Value) -> String {
    item.get("attributes")
        .and_then(|attributes| attributes.get("title"))
        .and_then(|title| title.as_str())
        .unwrap_or("Unknown")
        .to_string()
}

fn parse_article(item: &Value, context: &str) -> ToolResult<Article> {
    let attributes = item.get("attributes").unwrap_or(&NULL);
    Ok(Article {
        id: resource_id(item, context)?,
        title: attribute_title(item),
        state: attributes.get("state").and_then(as_i64),
    })
}

fn parse_category(item: &Value, context: &str) -> ToolResult<Category> {
    Ok(Category {
        id: resource_id(item, context)?,
        title: attribute_title(item),
    })
}
