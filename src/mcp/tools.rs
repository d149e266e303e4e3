//! MCPツール定義
//!
//! 各ツールは引数を専用の構造体にデシリアライズし、
//! `domain::article`のサービス関数を呼び出して表示用テキストを返す。

use crate::domain::article::{
    self, CreateArticleParams, DeleteArticleParams, JoomlaClient, ManageArticleStateParams,
    UpdateArticleParams,
};
use crate::mcp::protocol::ToolDefinition;
use crate::types::{ToolError, ToolResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// MCPツールのトレイト
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    /// アシスタント向けの説明
    fn description(&self) -> &'static str;

    /// 引数のJSONスキーマ
    fn input_schema(&self) -> Value;

    async fn execute(&self, arguments: Value) -> ToolResult<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// 引数を型付き構造体に変換する。欠落・型違いは検証エラー
fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::validation(format!("invalid arguments: {}", e)))
}

fn no_arguments_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

pub struct GetArticlesTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for GetArticlesTool {
    fn name(&self) -> &'static str {
        "get_joomla_articles"
    }

    fn description(&self) -> &'static str {
        "Retrieve all articles from the Joomla website (ID, title and state of each)."
    }

    fn input_schema(&self) -> Value {
        no_arguments_schema()
    }

    async fn execute(&self, _arguments: Value) -> ToolResult<String> {
        article::list_articles(&self.client).await
    }
}

pub struct GetCategoriesTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for GetCategoriesTool {
    fn name(&self) -> &'static str {
        "get_joomla_categories"
    }

    fn description(&self) -> &'static str {
        "Retrieve all categories from the Joomla website (ID and title of each)."
    }

    fn input_schema(&self) -> Value {
        no_arguments_schema()
    }

    async fn execute(&self, _arguments: Value) -> ToolResult<String> {
        article::list_categories(&self.client).await
    }
}

pub struct CreateArticleTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for CreateArticleTool {
    fn name(&self) -> &'static str {
        "create_article"
    }

    fn description(&self) -> &'static str {
        "Create a new article on the Joomla website. The title is inferred from the first \
         sentence when omitted. When category_id is omitted the available categories are \
         returned instead so one can be chosen."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "article_text": {
                    "type": "string",
                    "description": "Article content (plain text or HTML)"
                },
                "title": {
                    "type": "string",
                    "description": "Optional title (inferred from the content if missing)"
                },
                "category_id": {
                    "type": "integer",
                    "description": "Category ID (use get_joomla_categories to list them)"
                },
                "convert_plain_text": {
                    "type": "boolean",
                    "description": "Convert plain text paragraphs to HTML (default: true)",
                    "default": true
                },
                "published": {
                    "type": "boolean",
                    "description": "Publish immediately (true) or save unpublished (false)",
                    "default": true
                },
                "metadesc": {
                    "type": "string",
                    "description": "Optional meta description"
                }
            },
            "required": ["article_text"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult<String> {
        let params: CreateArticleParams = parse_arguments(arguments)?;
        article::create_article(&self.client, &params).await
    }
}

pub struct ManageArticleStateTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for ManageArticleStateTool {
    fn name(&self) -> &'static str {
        "manage_article_state"
    }

    fn description(&self) -> &'static str {
        "Change the state of an existing article: 1 = published, 0 = unpublished, \
         2 = archived, -2 = trashed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "article_id": {
                    "type": "integer",
                    "description": "ID of the article to update"
                },
                "target_state": {
                    "type": "integer",
                    "enum": [1, 0, 2, -2],
                    "description": "Desired state (1 published, 0 unpublished, 2 archived, -2 trashed)"
                }
            },
            "required": ["article_id", "target_state"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult<String> {
        let params: ManageArticleStateParams = parse_arguments(arguments)?;
        article::manage_article_state(&self.client, &params).await
    }
}

pub struct DeleteArticleTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for DeleteArticleTool {
    fn name(&self) -> &'static str {
        "delete_article"
    }

    fn description(&self) -> &'static str {
        "Delete an article from the Joomla website. The article is moved to the trash first \
         if needed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "article_id": {
                    "type": "integer",
                    "description": "ID of the article to delete"
                }
            },
            "required": ["article_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult<String> {
        let params: DeleteArticleParams = parse_arguments(arguments)?;
        article::delete_article(&self.client, &params).await
    }
}

pub struct UpdateArticleTool {
    client: JoomlaClient,
}

#[async_trait]
impl Tool for UpdateArticleTool {
    fn name(&self) -> &'static str {
        "update_article"
    }

    fn description(&self) -> &'static str {
        "Update an existing article. Both introtext (teaser) and fulltext (body after the \
         read-more break) are required; title and metadesc are optional. Look up the \
         article ID with get_joomla_articles first."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "article_id": {
                    "type": "integer",
                    "description": "ID of the article to update"
                },
                "introtext": {
                    "type": "string",
                    "description": "Introductory text (plain text or HTML)"
                },
                "fulltext": {
                    "type": "string",
                    "description": "Main content after the read-more break (plain text or HTML)"
                },
                "title": {
                    "type": "string",
                    "description": "Optional new title"
                },
                "metadesc": {
                    "type": "string",
                    "description": "Optional meta description"
                },
                "convert_plain_text": {
                    "type": "boolean",
                    "description": "Convert plain text paragraphs to HTML (default: true)",
                    "default": true
                }
            },
            "required": ["article_id", "introtext", "fulltext"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult<String> {
        let params: UpdateArticleParams = parse_arguments(arguments)?;
        article::update_article(&self.client, &params).await
    }
}

/// 登録済みツールの一覧（`tools/list`の順序を保つ）
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// 6つのJoomlaツールを登録する
    pub fn new(client: JoomlaClient) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(GetArticlesTool {
                client: client.clone(),
            }),
            Box::new(GetCategoriesTool {
                client: client.clone(),
            }),
            Box::new(CreateArticleTool {
                client: client.clone(),
            }),
            Box::new(ManageArticleStateTool {
                client: client.clone(),
            }),
            Box::new(DeleteArticleTool {
                client: client.clone(),
            }),
            Box::new(UpdateArticleTool { client }),
        ];
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }
}
