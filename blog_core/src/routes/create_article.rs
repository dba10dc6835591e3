use anyhow::Context;

use crate::Error;
use crate::articles::errors::CreateError;
use crate::articles::{ArticleDraft, ArticleForm, ArticleStore};
use crate::http::{Response, UrlEncodedBody};
use crate::views::Views;

/// Create a new article, then redirect to it.
///
/// Invalid submissions are sent back to the user, together with what's wrong with them.
pub async fn post(
    body: UrlEncodedBody<ArticleForm>,
    store: &ArticleStore,
    views: &Views,
) -> Result<Response, Error> {
    let form = body.0;
    match store.create(&form).await {
        Ok(article) => {
            let location = format!("/articles/{}", article.id);
            Ok(Response::redirect(&location).context("Invalid redirect location")?)
        }
        Err(CreateError::Validation(e)) => {
            let draft = ArticleDraft::from_submission(&form);
            let html = views
                .new_article(&draft, Some(&e))
                .context("Failed to render the creation form")?;
            Ok(Response::ok().set_typed_body(html))
        }
        Err(e) => Err(Error::new(e)),
    }
}
