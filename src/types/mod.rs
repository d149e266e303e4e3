//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定: 環境変数から構築する不変の`Config`
//! - エラー: 設定エラーとツール呼び出しエラー

pub mod config;
pub mod error;

// 便利な再エクスポート
pub use config::{Config, ConfigError, ConfigResult};
pub use error::{ToolError, ToolResult};
