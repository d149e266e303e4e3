use thiserror::Error;

/// Joomla REST APIの記事エンドポイント（ベースURLからの相対パス）
const ARTICLES_PATH: &str = "/api/index.php/v1/content/articles";
/// Joomla REST APIのカテゴリエンドポイント（ベースURLからの相対パス）
const CATEGORIES_PATH: &str = "/api/index.php/v1/content/categories";
/// リクエストタイムアウトの既定値（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "JOOMLA_BASE_URL";
pub const ENV_BEARER_TOKEN: &str = "BEARER_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "JOOMLA_TIMEOUT_SECS";

/// 設定関連のエラー型
/// 環境変数の不足や設定値の検証エラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 環境変数が見つからない
    #[error("missing environment variable: {name}")]
    MissingEnvironmentVariable { name: String },

    /// 設定値が不正
    #[error("invalid configuration value: {reason}")]
    InvalidValue { reason: String },
}

impl ConfigError {
    /// 環境変数不足エラーを作成
    pub fn missing_env_var<N: Into<String>>(name: N) -> Self {
        Self::MissingEnvironmentVariable { name: name.into() }
    }

    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// プロセス全体で共有する設定
///
/// 起動時に一度だけ構築し、以降は変更しない。
/// APIクライアントとツールハンドラには参照（`Arc`）で渡す。
#[derive(Clone)]
pub struct Config {
    base_url: String,
    bearer_token: String,
    timeout_secs: u64,
}

impl Config {
    /// 値を直接指定して設定を作成する（検証付き）
    pub fn new<U: Into<String>, T: Into<String>>(
        base_url: U,
        bearer_token: T,
        timeout_secs: u64,
    ) -> ConfigResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::missing_env_var(ENV_BASE_URL));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid_value(format!(
                "{} must start with http:// or https:// (got '{}')",
                ENV_BASE_URL, base_url
            )));
        }

        let bearer_token = bearer_token.into().trim().to_string();
        if bearer_token.is_empty() {
            return Err(ConfigError::missing_env_var(ENV_BEARER_TOKEN));
        }

        if timeout_secs == 0 {
            return Err(ConfigError::invalid_value(format!(
                "{} must be a positive number of seconds",
                ENV_TIMEOUT_SECS
            )));
        }

        Ok(Self {
            base_url,
            bearer_token,
            timeout_secs,
        })
    }

    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    ///
    /// テストではプロセスの環境変数を書き換えずにクロージャで値を渡せる。
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url =
            lookup(ENV_BASE_URL).ok_or_else(|| ConfigError::missing_env_var(ENV_BASE_URL))?;
        let bearer_token = lookup(ENV_BEARER_TOKEN)
            .ok_or_else(|| ConfigError::missing_env_var(ENV_BEARER_TOKEN))?;

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::invalid_value(format!(
                    "{} must be a positive integer (got '{}')",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self::new(base_url, bearer_token, timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// 記事コレクションのURL
    pub fn articles_url(&self) -> String {
        format!("{}{}", self.base_url, ARTICLES_PATH)
    }

    /// 個別記事のURL
    pub fn article_url(&self, article_id: u64) -> String {
        format!("{}{}/{}", self.base_url, ARTICLES_PATH, article_id)
    }

    /// カテゴリコレクションのURL
    pub fn categories_url(&self) -> String {
        format!("{}{}", self.base_url, CATEGORIES_PATH)
    }
}

// トークンをログに出さないため手動実装
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
