//! MCP (Model Context Protocol) サーバー
//!
//! Joomlaの記事・カテゴリ操作を6つのツールとしてアシスタントに公開する。

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
