use std::sync::Arc;

use super::errors::{CreateError, DeleteError, FindError, ListError, UpdateError, UnknownIdError};
use super::{Article, ArticleDraft, ArticleForm, ArticleId};

/// Where articles are stored.
///
/// It is a thin wrapper
/// [around your chosen storage backend implementation][`ArticleStorageBackend`],
/// removing the need to specify the concrete type of the storage backend
/// everywhere in your code.
///
/// Submissions are validated here, before reaching the backend:
/// every backend enforces the same rules.
#[derive(Debug, Clone)]
pub struct ArticleStore(Arc<dyn ArticleStorageBackend>);

impl ArticleStore {
    /// Creates a new article store using the provided backend.
    pub fn new<Backend>(backend: Backend) -> Self
    where
        Backend: ArticleStorageBackend + 'static,
    {
        Self(Arc::new(backend))
    }

    /// Retrieve all articles, most recent first.
    pub async fn list(&self) -> Result<Vec<Article>, ListError> {
        self.0.list().await
    }

    /// Retrieve the article with the given ID, if it exists.
    pub async fn find(&self, id: ArticleId) -> Result<Option<Article>, FindError> {
        self.0.find(id).await
    }

    /// Validate a creation form and store the resulting article.
    pub async fn create(&self, form: &ArticleForm) -> Result<Article, CreateError> {
        let draft = ArticleDraft::from_submission(form);
        draft.validate()?;
        self.0.create(&draft).await
    }

    /// Apply the fields present in `form` to an existing article.
    ///
    /// The stored article is left untouched if the outcome fails validation:
    /// the rejected draft is returned in [`UpdateError::Validation`].
    pub async fn update(&self, id: ArticleId, form: &ArticleForm) -> Result<Article, UpdateError> {
        let existing = self
            .0
            .find(id)
            .await
            .map_err(|e| UpdateError::Other(e.into()))?
            .ok_or(UnknownIdError { id })?;
        let draft = ArticleDraft::merge(&existing, form);
        if let Err(errors) = draft.validate() {
            return Err(UpdateError::Validation { draft, errors });
        }
        self.0.update(id, &draft).await
    }

    /// Delete the article with the given ID.
    ///
    /// Deleting a missing article changes nothing and returns
    /// [`DeleteError::UnknownId`].
    pub async fn delete(&self, id: ArticleId) -> Result<(), DeleteError> {
        self.0.delete(id).await
    }
}

#[async_trait::async_trait]
/// The interface of an article storage backend.
///
/// Backends store what they are given: validation is performed
/// by [`ArticleStore`] ahead of any write.
pub trait ArticleStorageBackend: std::fmt::Debug + Send + Sync {
    /// Retrieve all articles, ordered by creation time (most recent first).
    ///
    /// Ties are broken by ID, highest first.
    async fn list(&self) -> Result<Vec<Article>, ListError>;

    /// Retrieve the article with the given ID.
    ///
    /// It returns `None` if there is no such article.
    async fn find(&self, id: ArticleId) -> Result<Option<Article>, FindError>;

    /// Store a new article, assigning it a fresh ID.
    async fn create(&self, draft: &ArticleDraft) -> Result<Article, CreateError>;

    /// Overwrite the content of an existing article.
    async fn update(&self, id: ArticleId, draft: &ArticleDraft) -> Result<Article, UpdateError>;

    /// Delete an existing article.
    async fn delete(&self, id: ArticleId) -> Result<(), DeleteError>;
}
