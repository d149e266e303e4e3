pub mod model;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート

// model.rsから
pub use model::{
    describe_state, format_article_list, format_category_list, generate_alias, infer_title,
    Article, ArticleState, Category,
};

// repository.rsから
pub use repository::{ArticlePatch, JoomlaClient, NewArticle};

// service.rsから
pub use service::{
    create_article, delete_article, list_articles, list_categories, manage_article_state,
    update_article, CreateArticleParams, DeleteArticleParams, ManageArticleStateParams,
    UpdateArticleParams,
};
