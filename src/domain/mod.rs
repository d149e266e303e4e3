//! ドメインモジュール
//!
//! - article: 記事・カテゴリのモデル、Joomla APIリポジトリ、ツールの処理本体
//! - content: プレーンテキストのHTML変換とサニタイズ

pub mod article;
pub mod content;
