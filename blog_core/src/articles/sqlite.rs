use anyhow::Context as _;
use jiff::Timestamp;
use sqlx::sqlite::{SqlitePool, SqliteQueryResult, SqliteRow};

use super::errors::{CreateError, DeleteError, FindError, ListError, UnknownIdError, UpdateError};
use super::{Article, ArticleDraft, ArticleId, ArticleStorageBackend, ArticleStore};

#[derive(Debug, Clone)]
/// An article store using SQLite as its backend.
///
/// # Implementation details
///
/// This store uses `sqlx` to interact with SQLite.
/// Articles are stored in a single table, with timestamps saved
/// as microseconds since the UNIX epoch.
/// You can use [`migrate`](Self::migrate) to create the table and index
/// required by the store in the database.
/// Alternatively, you can use [`migration_query`](Self::migration_query)
/// to get the SQL query that creates the table and index in order to run it yourself.
pub struct SqliteArticleStore(SqlitePool);

impl From<SqliteArticleStore> for ArticleStore {
    fn from(value: SqliteArticleStore) -> Self {
        ArticleStore::new(value)
    }
}

impl SqliteArticleStore {
    /// Creates a new SQLite article store instance.
    ///
    /// It requires a pool of SQLite connections to interact with the database
    /// where the articles are stored.
    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    /// Return the query used to create the articles table and index.
    ///
    /// The query is idempotent: it does nothing if the table and index
    /// already exist.
    pub fn migration_query() -> &'static str {
        "-- Create the articles table if it doesn't exist
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Create the index on the created_at column if it doesn't exist
CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);"
    }

    /// Create the articles table and index in the database.
    ///
    /// It can be called multiple times: if the table and index already exist,
    /// this method does nothing.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        use sqlx::Executor as _;

        self.0.execute(Self::migration_query()).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArticleStorageBackend for SqliteArticleStore {
    #[tracing::instrument(name = "List articles", level = tracing::Level::INFO, skip_all)]
    async fn list(&self) -> Result<Vec<Article>, ListError> {
        let rows = sqlx::query(
            "SELECT id, title, author, body, created_at, updated_at \
            FROM articles \
            ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.0)
        .await
        .map_err(|e| ListError::Other(e.into()))?;
        rows.iter()
            .map(article_from_row)
            .collect::<Result<_, _>>()
            .map_err(ListError::Other)
    }

    #[tracing::instrument(name = "Load article", level = tracing::Level::INFO, skip(self))]
    async fn find(&self, id: ArticleId) -> Result<Option<Article>, FindError> {
        let row = sqlx::query(
            "SELECT id, title, author, body, created_at, updated_at \
            FROM articles \
            WHERE id = ?",
        )
        .bind(id.inner())
        .fetch_optional(&self.0)
        .await
        .map_err(|e| FindError::Other(e.into()))?;
        row.as_ref()
            .map(article_from_row)
            .transpose()
            .map_err(FindError::Other)
    }

    #[tracing::instrument(name = "Create article", level = tracing::Level::INFO, skip_all)]
    async fn create(&self, draft: &ArticleDraft) -> Result<Article, CreateError> {
        let now = super::now().map_err(|e| CreateError::Other(e.into()))?;
        let query = sqlx::query(
            "INSERT INTO articles (title, author, body, created_at, updated_at) \
            VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.body)
        .bind(now.as_microsecond())
        .bind(now.as_microsecond());

        let r = query
            .execute(&self.0)
            .await
            .map_err(|e| CreateError::Other(e.into()))?;
        Ok(Article {
            id: ArticleId::new(r.last_insert_rowid()),
            title: draft.title.clone(),
            author: draft.author.clone(),
            body: draft.body.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    #[tracing::instrument(name = "Update article", level = tracing::Level::INFO, skip(self, draft))]
    async fn update(&self, id: ArticleId, draft: &ArticleDraft) -> Result<Article, UpdateError> {
        let now = super::now().map_err(|e| UpdateError::Other(e.into()))?;
        let row = sqlx::query(
            "UPDATE articles \
            SET title = ?, author = ?, body = ?, updated_at = ? \
            WHERE id = ? \
            RETURNING id, title, author, body, created_at, updated_at",
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.body)
        .bind(now.as_microsecond())
        .bind(id.inner())
        .fetch_optional(&self.0)
        .await
        .map_err(|e| UpdateError::Other(e.into()))?;
        match row {
            Some(row) => article_from_row(&row).map_err(UpdateError::Other),
            None => Err(UnknownIdError { id }.into()),
        }
    }

    #[tracing::instrument(name = "Delete article", level = tracing::Level::INFO, skip(self))]
    async fn delete(&self, id: ArticleId) -> Result<(), DeleteError> {
        let query = sqlx::query("DELETE FROM articles WHERE id = ?").bind(id.inner());
        match query.execute(&self.0).await {
            Ok(r) => as_unknown_id_error(&r, id).map_err(Into::into),
            Err(e) => Err(DeleteError::Other(e.into())),
        }
    }
}

fn article_from_row(row: &SqliteRow) -> Result<Article, anyhow::Error> {
    use sqlx::Row as _;

    let timestamp = |column: &str| -> Result<Timestamp, anyhow::Error> {
        let micros: i64 = row
            .try_get(column)
            .with_context(|| format!("Failed to retrieve the `{column}` column"))?;
        Timestamp::from_microsecond(micros)
            .with_context(|| format!("`{column}` is not a valid timestamp"))
    };
    Ok(Article {
        id: ArticleId::new(row.try_get("id").context("Failed to retrieve the article id")?),
        title: row.try_get("title").context("Failed to retrieve the article title")?,
        author: row.try_get("author").context("Failed to retrieve the article author")?,
        body: row.try_get("body").context("Failed to retrieve the article body")?,
        created_at: timestamp("created_at")?,
        updated_at: timestamp("updated_at")?,
    })
}

fn as_unknown_id_error(r: &SqliteQueryResult, id: ArticleId) -> Result<(), UnknownIdError> {
    // Nothing was deleted
    if r.rows_affected() == 0 {
        return Err(UnknownIdError { id });
    }
    Ok(())
}
