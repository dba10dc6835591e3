use anyhow::Context;

use crate::Error;
use crate::articles::{ArticleDraft, ArticleForm};
use crate::http::Response;
use crate::views::Views;

/// Show an empty creation form.
pub fn get(views: &Views) -> Result<Response, Error> {
    let draft = ArticleDraft::from_submission(&ArticleForm::default());
    let html = views
        .new_article(&draft, None)
        .context("Failed to render the creation form")?;
    Ok(Response::ok().set_typed_body(html))
}
