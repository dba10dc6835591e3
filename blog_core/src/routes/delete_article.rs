use anyhow::Context;

use super::ArticlePath;
use crate::Error;
use crate::articles::ArticleStore;
use crate::articles::errors::DeleteError;
use crate::http::{PathParams, Response};
use crate::views::Views;

/// Ask for confirmation before deleting an article.
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
        .delete_article(&article)
        .context("Failed to render the confirmation page")?;
    Ok(Response::ok().set_typed_body(html))
}

/// Delete an article, then go back to the list of articles.
pub async fn post(params: PathParams<ArticlePath>, store: &ArticleStore) -> Result<Response, Error> {
    let Some(id) = ArticlePath::article_id(&params) else {
        return Ok(Response::not_found());
    };
    match store.delete(id).await {
        Ok(()) => Ok(Response::redirect("/articles").context("Invalid redirect location")?),
        Err(DeleteError::UnknownId(_)) => Ok(Response::not_found()),
        Err(e) => Err(Error::new(e)),
    }
}
