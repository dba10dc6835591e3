use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::errors::{CreateError, DeleteError, FindError, ListError, UnknownIdError, UpdateError};
use super::{Article, ArticleDraft, ArticleId, ArticleStorageBackend, ArticleStore};

#[derive(Clone, Default)]
/// An in-memory article store.
///
/// # Limitations
///
/// This store won't persist data between server restarts.
/// It is primarily intended for testing and local development.
pub struct InMemoryArticleStore(Arc<Mutex<State>>);

#[derive(Default)]
struct State {
    last_id: i64,
    articles: BTreeMap<ArticleId, Article>,
}

impl std::fmt::Debug for InMemoryArticleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryArticleStore")
            .finish_non_exhaustive()
    }
}

impl From<InMemoryArticleStore> for ArticleStore {
    fn from(value: InMemoryArticleStore) -> Self {
        ArticleStore::new(value)
    }
}

impl InMemoryArticleStore {
    /// Creates a new (empty) in-memory article store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ArticleStorageBackend for InMemoryArticleStore {
    #[tracing::instrument(name = "List articles", level = tracing::Level::TRACE, skip_all)]
    async fn list(&self) -> Result<Vec<Article>, ListError> {
        let guard = self.0.lock().await;
        let mut articles: Vec<_> = guard.articles.values().cloned().collect();
        articles.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(articles)
    }

    #[tracing::instrument(name = "Load article", level = tracing::Level::TRACE, skip(self))]
    async fn find(&self, id: ArticleId) -> Result<Option<Article>, FindError> {
        let guard = self.0.lock().await;
        Ok(guard.articles.get(&id).cloned())
    }

    #[tracing::instrument(name = "Create article", level = tracing::Level::TRACE, skip_all)]
    async fn create(&self, draft: &ArticleDraft) -> Result<Article, CreateError> {
        let now = super::now().map_err(|e| CreateError::Other(e.into()))?;
        let mut guard = self.0.lock().await;
        guard.last_id += 1;
        let article = Article {
            id: ArticleId::new(guard.last_id),
            title: draft.title.clone(),
            author: draft.author.clone(),
            body: draft.body.clone(),
            created_at: now,
            updated_at: now,
        };
        guard.articles.insert(article.id, article.clone());
        Ok(article)
    }

    #[tracing::instrument(name = "Update article", level = tracing::Level::TRACE, skip(self, draft))]
    async fn update(&self, id: ArticleId, draft: &ArticleDraft) -> Result<Article, UpdateError> {
        let now = super::now().map_err(|e| UpdateError::Other(e.into()))?;
        let mut guard = self.0.lock().await;
        let Some(article) = guard.articles.get_mut(&id) else {
            return Err(UnknownIdError { id }.into());
        };
        article.title = draft.title.clone();
        article.author = draft.author.clone();
        article.body = draft.body.clone();
        article.updated_at = now;
        Ok(article.clone())
    }

    #[tracing::instrument(name = "Delete article", level = tracing::Level::TRACE, skip(self))]
    async fn delete(&self, id: ArticleId) -> Result<(), DeleteError> {
        let mut guard = self.0.lock().await;
        match guard.articles.remove(&id) {
            Some(_) => Ok(()),
            None => Err(UnknownIdError { id }.into()),
        }
    }
}
