use crate::types::{ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 自動生成するタイトルの最大文字数
pub const MAX_INFERRED_TITLE_CHARS: usize = 50;

// 記事の公開状態（Joomlaの数値表現と一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ArticleState {
    Trashed,
    Unpublished,
    Published,
    Archived,
}

impl ArticleState {
    pub const ALL: [ArticleState; 4] = [
        ArticleState::Published,
        ArticleState::Unpublished,
        ArticleState::Archived,
        ArticleState::Trashed,
    ];

    /// Joomla APIでの数値
    pub fn code(self) -> i64 {
        match self {
            ArticleState::Trashed => -2,
            ArticleState::Unpublished => 0,
            ArticleState::Published => 1,
            ArticleState::Archived => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArticleState::Trashed => "trashed",
            ArticleState::Unpublished => "unpublished",
            ArticleState::Published => "published",
            ArticleState::Archived => "archived",
        }
    }

    /// 有効な状態値の説明（エラーメッセージ用）
    pub fn valid_values_description() -> String {
        Self::ALL
            .iter()
            .map(|state| format!("{} ({})", state.code(), state.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TryFrom<i64> for ArticleState {
    type Error = ToolError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -2 => Ok(ArticleState::Trashed),
            0 => Ok(ArticleState::Unpublished),
            1 => Ok(ArticleState::Published),
            2 => Ok(ArticleState::Archived),
            other => Err(ToolError::validation(format!(
                "invalid target state {}. Valid states are {}.",
                other,
                Self::valid_values_description()
            ))),
        }
    }
}

impl From<ArticleState> for i64 {
    fn from(state: ArticleState) -> Self {
        state.code()
    }
}

impl fmt::Display for ArticleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// CMSから受け取った状態値を表示用に変換する
///
/// 範囲外の値はエラーにせず`unknown (n)`と表示する。
pub fn describe_state(code: Option<i64>) -> String {
    match code.map(ArticleState::try_from) {
        Some(Ok(state)) => state.to_string(),
        Some(Err(_)) => format!("unknown ({})", code.unwrap_or_default()),
        None => "unknown".to_string(),
    }
}

// 記事エンティティ（CMSのレスポンスから必要な属性のみ保持）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub state: Option<i64>,
}

impl Article {
    /// 状態値が既知の状態であればそれを返す
    pub fn known_state(&self) -> Option<ArticleState> {
        self.state.and_then(|code| ArticleState::try_from(code).ok())
    }

    pub fn state_label(&self) -> String {
        describe_state(self.state)
    }
}

// カテゴリエンティティ（読み取り専用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub title: String,
}

/// 記事一覧を表示用テキストに整形する
pub fn format_article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.".to_string();
    }

    let mut result = String::from("Articles:\n");
    for article in articles {
        result.push_str(&format!(
            "- ID: {}, Title: {}, State: {}\n",
            article.id,
            article.title,
            article.state_label()
        ));
    }
    result
}

/// カテゴリ一覧を表示用テキストに整形する
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let mut result = String::from("Available categories:\n");
    for category in categories {
        result.push_str(&format!(
            "- ID: {}, Title: {}\n",
            category.id, category.title
        ));
    }
    result
}

/// 本文のプレーンテキストからタイトルを推測する
///
/// 最初の空でない行の、最初の文（`.` `!` `?` の後に空白または終端）を使う。
/// 長すぎる場合は文字境界で切り詰めて`...`を付ける。
pub fn infer_title(text: &str) -> ToolResult<String> {
    let first_line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| ToolError::validation("cannot infer a title from empty article text"))?;

    let sentence = first_sentence(first_line);
    if sentence.chars().count() > MAX_INFERRED_TITLE_CHARS {
        let cut: String = sentence.chars().take(MAX_INFERRED_TITLE_CHARS).collect();
        Ok(format!("{}...", cut.trim_end()))
    } else {
        Ok(sentence.to_string())
    }
}

fn first_sentence(line: &str) -> &str {
    let mut chars = line.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                None => true,
                Some((_, next)) => next.is_whitespace(),
            };
            if at_boundary {
                return &line[..index + c.len_utf8()];
            }
        }
    }
    line
}

/// タイトルからURLエイリアス（スラッグ）を生成する
///
/// 小文字化し、英数字・空白・ハイフン以外を除去、空白はハイフンに置換する。
pub fn generate_alias(title: &str) -> String {
    let filtered: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .trim_matches('-')
        .to_string()
}
