use thiserror::Error;

/// CMSのエラー本文をメッセージに含める際の上限文字数
const MAX_DETAIL_CHARS: usize = 500;

/// ツール呼び出しのエラー型
///
/// 呼び出し元（アシスタント）にそのまま表示されるため、
/// メッセージは英語で人が読める形にしている。
#[derive(Error, Debug)]
pub enum ToolError {
    /// 引数の検証エラー（CMSへのリクエストは行わない）
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// 指定IDの記事が存在しない
    #[error("Article {article_id} was not found.")]
    NotFound { article_id: u64 },

    /// CMSが非成功ステータスを返した
    #[error("Joomla API returned HTTP {status}: {detail}")]
    Remote { status: u16, detail: String },

    /// ネットワーク障害・タイムアウト
    #[error("Could not reach the Joomla API: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// 成功ステータスだが本文が想定外
    #[error("Unexpected response from Joomla API ({context}): {reason}")]
    UnexpectedResponse { context: String, reason: String },
}

impl ToolError {
    /// 検証エラーを作成
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(article_id: u64) -> Self {
        Self::NotFound { article_id }
    }

    /// CMSのレスポンス本文から詳細を抽出してリモートエラーを作成
    pub fn remote(status: u16, body: &str) -> Self {
        Self::Remote {
            status,
            detail: extract_error_detail(body),
        }
    }

    pub fn transport(source: reqwest::Error) -> Self {
        Self::Transport { source }
    }

    /// 想定外レスポンスエラーを作成
    pub fn unexpected<C: Into<String>, R: Into<String>>(context: C, reason: R) -> Self {
        Self::UnexpectedResponse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// 呼び出し元の入力に起因するエラーかどうか
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// ツールエラーのResult型エイリアス
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// JoomlaのJSON:APIエラー本文（`{"errors":[{"title":..}]}`）からタイトルを抽出する
///
/// JSONでない場合は本文をそのまま（上限付きで）返す。
fn extract_error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let titles: Vec<&str> = value
            .get("errors")
            .and_then(|errors| errors.as_array())
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("title").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        if !titles.is_empty() {
            return titles.join("; ");
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    if trimmed.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
