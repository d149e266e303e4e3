use super::model::{
    format_article_list, format_category_list, generate_alias, infer_title, Article, ArticleState,
};
use super::repository::{ArticlePatch, JoomlaClient, NewArticle};
use crate::domain::content::{plain_text, prepare_body};
use crate::types::{ToolError, ToolResult};
use serde::Deserialize;
use tracing::info;

fn default_true() -> bool {
    true
}

/// 空白のみの文字列を`None`として扱う
fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

// 記事作成ツールの引数
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticleParams {
    pub article_text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default = "default_true")]
    pub convert_plain_text: bool,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub metadesc: Option<String>,
}

// 状態変更ツールの引数（状態値の範囲検証はサービス側で行う）
#[derive(Debug, Clone, Deserialize)]
pub struct ManageArticleStateParams {
    pub article_id: u64,
    pub target_state: i64,
}

// 削除ツールの引数
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteArticleParams {
    pub article_id: u64,
}

// 更新ツールの引数（introtextとfulltextは必須）
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArticleParams {
    pub article_id: u64,
    pub introtext: String,
    pub fulltext: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadesc: Option<String>,
    #[serde(default = "default_true")]
    pub convert_plain_text: bool,
}

/// 記事一覧を取得して整形する
pub async fn list_articles(client: &JoomlaClient) -> ToolResult<String> {
    let articles = client.list_articles().await?;
    info!(count = articles.len(), "記事一覧を取得しました");
    Ok(format_article_list(&articles))
}

/// カテゴリ一覧を取得して整形する
pub async fn list_categories(client: &JoomlaClient) -> ToolResult<String> {
    let categories = client.list_categories().await?;
    info!(count = categories.len(), "カテゴリ一覧を取得しました");
    Ok(format_category_list(&categories))
}

/// 記事を作成する
///
/// カテゴリ未指定の場合は作成せず、カテゴリ一覧を返して指定を求める。
/// タイトル未指定の場合は本文の最初の文から推測する。
pub async fn create_article(
    client: &JoomlaClient,
    params: &CreateArticleParams,
) -> ToolResult<String> {
    if params.article_text.trim().is_empty() {
        return Err(ToolError::validation("article_text must not be empty"));
    }

    let body = prepare_body(&params.article_text, params.convert_plain_text);
    let body_text = plain_text(&body);
    if body_text.trim().is_empty() {
        return Err(ToolError::validation(
            "article_text has no content left after removing disallowed markup",
        ));
    }

    let title = match non_blank(&params.title) {
        Some(title) => title.to_string(),
        None => infer_title(&body_text)?,
    };

    let category_id = match params.category_id {
        Some(id) => id,
        None => {
            let categories = client.list_categories().await?;
            return Ok(format!(
                "{}\nPlease specify a category ID.",
                format_category_list(&categories)
            ));
        }
    };

    let categories = client.list_categories().await?;
    if !categories.iter().any(|category| category.id == category_id) {
        return Err(ToolError::validation(format!(
            "Category ID {} is not valid.",
            category_id
        )));
    }

    let alias = generate_alias(&title);
    let state = if params.published {
        ArticleState::Published
    } else {
        ArticleState::Unpublished
    };
    let new_article = NewArticle {
        title: title.clone(),
        alias: (!alias.is_empty()).then_some(alias),
        articletext: body,
        catid: category_id,
        language: "*".to_string(),
        metadesc: non_blank(&params.metadesc).unwrap_or_default().to_string(),
        metakey: String::new(),
        state,
    };

    let created = client.create_article(&new_article).await?;
    info!(article_id = created.id, category_id, "記事を作成しました");

    Ok(format!(
        "Successfully created {} article '{}' (ID: {}) in category ID {}.",
        state, title, created.id, category_id
    ))
}

/// 記事の公開状態を変更する
///
/// 状態値は呼び出し前に検証し、範囲外ならCMSへは一切リクエストしない。
pub async fn manage_article_state(
    client: &JoomlaClient,
    params: &ManageArticleStateParams,
) -> ToolResult<String> {
    let target = ArticleState::try_from(params.target_state)?;
    let article = client.get_article(params.article_id).await?;

    if article.known_state() == Some(target) {
        return Ok(format!(
            "Article '{}' (ID: {}) is already {}.",
            article.title, article.id, target
        ));
    }

    let previous = change_state(client, &article, target).await?;
    Ok(format!(
        "Updated article '{}' (ID: {}): {} → {}.",
        article.title, article.id, previous, target
    ))
}

/// 状態を変更し、変更前の状態の表示名を返す
async fn change_state(
    client: &JoomlaClient,
    article: &Article,
    target: ArticleState,
) -> ToolResult<String> {
    let previous = article.state_label();
    client
        .patch_article(article.id, &ArticlePatch::state(target))
        .await?;
    info!(article_id = article.id, from = %previous, to = %target, "記事の状態を変更しました");
    Ok(previous)
}

/// 記事を削除する
///
/// Joomlaはゴミ箱状態の記事しか削除できないため、必要なら先にゴミ箱へ移す。
pub async fn delete_article(
    client: &JoomlaClient,
    params: &DeleteArticleParams,
) -> ToolResult<String> {
    let article = client.get_article(params.article_id).await?;

    if article.known_state() != Some(ArticleState::Trashed) {
        change_state(client, &article, ArticleState::Trashed).await?;
    }

    client.delete_article(article.id).await?;
    info!(article_id = article.id, "記事を削除しました");

    Ok(format!(
        "Successfully deleted article '{}' (ID: {}).",
        article.title, article.id
    ))
}

/// 記事の本文・タイトル・メタ説明を更新する
pub async fn update_article(
    client: &JoomlaClient,
    params: &UpdateArticleParams,
) -> ToolResult<String> {
    if params.introtext.trim().is_empty() {
        return Err(ToolError::validation(
            "introtext is required and must not be empty",
        ));
    }
    if params.fulltext.trim().is_empty() {
        return Err(ToolError::validation(
            "fulltext is required and must not be empty",
        ));
    }

    let article = client.get_article(params.article_id).await?;

    let title = non_blank(&params.title);
    let metadesc = non_blank(&params.metadesc);
    let alias = title.map(generate_alias).filter(|alias| !alias.is_empty());

    let patch = ArticlePatch {
        title: title.map(str::to_string),
        alias,
        introtext: Some(prepare_body(&params.introtext, params.convert_plain_text)),
        fulltext: Some(prepare_body(&params.fulltext, params.convert_plain_text)),
        metadesc: metadesc.map(str::to_string),
        state: None,
    };
    client.patch_article(article.id, &patch).await?;
    info!(article_id = article.id, "記事を更新しました");

    let mut updated_fields = Vec::new();
    if let Some(title) = title {
        updated_fields.push(format!("title to '{}'", title));
    }
    updated_fields.push("introtext".to_string());
    updated_fields.push("fulltext".to_string());
    if metadesc.is_some() {
        updated_fields.push("metadesc".to_string());
    }

    Ok(format!(
        "Successfully updated article '{}' (ID: {}): {}.",
        article.title,
        article.id,
        updated_fields.join(", ")
    ))
}
