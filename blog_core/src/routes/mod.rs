//! One module per HTTP endpoint.
//!
//! The route table lives in [`crate::router`].
pub mod create_article;
pub mod delete_article;
pub mod edit_article;
pub mod get_article;
pub mod home;
pub mod list_articles;
pub mod new_article;
pub mod ping;

use crate::articles::ArticleId;
use crate::http::PathParams;

/// The path parameters for every route nested under `/articles/{id}`.
#[derive(Debug, serde::Deserialize)]
pub struct ArticlePath {
    pub id: String,
}

impl ArticlePath {
    /// The identifier of the targeted article.
    ///
    /// It returns `None` if `{id}` is not an integer: no such article can exist.
    pub fn article_id(params: &PathParams<ArticlePath>) -> Option<ArticleId> {
        params.0.id.parse().ok()
    }
}
