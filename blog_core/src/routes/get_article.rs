use anyhow::Context;

use super::ArticlePath;
use crate::Error;
use crate::articles::ArticleStore;
use crate::http::{PathParams, Response};
use crate::views::Views;

/// Show a single article.
pub async fn get(
    params: PathParams<ArticlePath>,
    store: &ArticleStore,
    views: &Views,
) -> Result<Response, Error> {
    let Some(id) = ArticlePath::article_id(&params) else {
        return Ok(Response::not_found());
    };
    let Some(article) = store.find(id).await.context("Failed to load the article")? else {
        return Ok(Response::not_found());
    };
    let html = views
        .show_article(&article)
        .context("Failed to render the article")?;
    Ok(Response::ok().set_typed_body(html))
}
