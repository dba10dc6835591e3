use anyhow::Context;

use super::ArticlePath;
use crate::Error;
use crate::articles::errors::UpdateError;
use crate::articles::{ArticleDraft, ArticleForm, ArticleStore};
use crate::http::{PathParams, Response, UrlEncodedBody};
use crate::views::Views;

/// Show the edit form, pre-filled with the current content of the article.
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
    let draft = ArticleDraft {
        title: article.title,
        author: article.author,
        body: article.body,
    };
    let html = views
        .edit_article(id, &draft, None)
        .context("Failed to render the edit form")?;
    Ok(Response::ok().set_typed_body(html))
}

/// Apply the submitted changes, then redirect to the updated article.
///
/// If the outcome is invalid, nothing is changed and the edit form is shown
/// again: submitted values on top of the stored ones.
pub async fn post(
    params: PathParams<ArticlePath>,
    body: UrlEncodedBody<ArticleForm>,
    store: &ArticleStore,
    views: &Views,
) -> Result<Response, Error> {
    let Some(id) = ArticlePath::article_id(&params) else {
        return Ok(Response::not_found());
    };
    let form = body.0;
    match store.update(id, &form).await {
        Ok(article) => {
            let location = format!("/articles/{}", article.id);
            Ok(Response::redirect(&location).context("Invalid redirect location")?)
        }
        Err(UpdateError::UnknownId(_)) => Ok(Response::not_found()),
        Err(UpdateError::Validation { draft, errors }) => {
            let html = views
                .edit_article(id, &draft, Some(&errors))
                .context("Failed to render the edit form")?;
            Ok(Response::ok().set_typed_body(html))
        }
        Err(e) => Err(Error::new(e)),
    }
}
