//! Joomla記事管理MCPサーバー
//!
//! JoomlaのREST API（記事・カテゴリのCRUD）を、AIアシスタントから
//! 呼び出せるMCPツールとして公開する薄いアダプタ。
//!
//! - types: 設定とエラー型
//! - infra: HTTPクライアント（reqwest実装とテスト用モック）
//! - domain: 記事モデル、Joomla APIリポジトリ、本文変換・サニタイズ
//! - mcp: JSON-RPCプロトコル、ツール定義、stdioサーバー

pub mod domain;
pub mod infra;
pub mod mcp;
pub mod types;
