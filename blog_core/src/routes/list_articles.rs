use anyhow::Context;

use crate::Error;
use crate::articles::ArticleStore;
use crate::http::Response;
use crate::views::Views;

/// List all articles, most recent first.
pub async fn get(store: &ArticleStore, views: &Views) -> Result<Response, Error> {
    let articles = store.list().await.context("Failed to list articles")?;
    let html = views
        .index(&articles)
        .context("Failed to render the list of articles")?;
    Ok(Response::ok().set_typed_body(html))
}
