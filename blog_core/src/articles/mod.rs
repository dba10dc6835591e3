//! Articles: the entity, its presentation helpers and its persistence.
//!
//! Handlers interact with articles exclusively via [`ArticleStore`], which
//! validates submissions before handing them over to the configured
//! [`ArticleStorageBackend`].
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use jiff::tz::TimeZone;

pub use memory::InMemoryArticleStore;
pub use sqlite::SqliteArticleStore;
pub use store::{ArticleStorageBackend, ArticleStore};

mod memory;
mod sqlite;
mod store;

pub mod errors;

/// The author recorded on new articles when the submission doesn't name one.
pub const DEFAULT_AUTHOR: &str = "Julian";

/// The maximum number of characters shown by [`short_description`].
pub const SHORT_DESCRIPTION_LENGTH: usize = 200;

/// The current time, truncated to the microsecond precision timestamps are stored with.
fn now() -> Result<Timestamp, jiff::Error> {
    Timestamp::from_microsecond(Timestamp::now().as_microsecond())
}

/// The identifier of a stored article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleId(i64);

impl ArticleId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArticleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub author: String,
    pub body: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Article {
    /// See [`published_at`].
    pub fn published_at(&self) -> String {
        published_at(self.created_at)
    }

    /// See [`short_description`].
    pub fn short_description(&self) -> Cow<'_, str> {
        short_description(&self.body)
    }
}

/// Format a creation timestamp for display, e.g. `October 17, 2026, 3:04pm`.
///
/// The timestamp is rendered in UTC.
pub fn published_at(created_at: Timestamp) -> String {
    created_at
        .to_zoned(TimeZone::UTC)
        .strftime("%B %-d, %Y, %-I:%M%P")
        .to_string()
}

/// The first [`SHORT_DESCRIPTION_LENGTH`] characters of `body`, followed by
/// `...` if anything was cut off.
///
/// Bodies that fit are returned unchanged.
pub fn short_description(body: &str) -> Cow<'_, str> {
    match body.char_indices().nth(SHORT_DESCRIPTION_LENGTH) {
        Some((cutoff, _)) => Cow::Owned(format!("{}...", &body[..cutoff])),
        None => Cow::Borrowed(body),
    }
}

/// The fields of an article, as submitted via the creation or edit form.
///
/// Every field is optional: a missing field is either defaulted or reported
/// as a validation error, depending on the operation.
///
/// A field submitted with an empty value is kept as `Some("")`, so that it
/// fails validation instead of being treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ArticleForm {
    #[serde(default, deserialize_with = "submitted")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "submitted")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "submitted")]
    pub body: Option<String>,
}

fn submitted<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <String as serde::Deserialize>::deserialize(deserializer).map(Some)
}

/// The content of an article that has not been persisted (yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub author: String,
    pub body: String,
}

impl ArticleDraft {
    /// Build a draft out of a creation form.
    ///
    /// The author falls back to [`DEFAULT_AUTHOR`] when the field is missing.
    /// Missing titles and bodies are left empty, to be caught by [`ArticleDraft::validate`].
    pub fn from_submission(form: &ArticleForm) -> Self {
        Self {
            title: form.title.clone().unwrap_or_default(),
            author: form
                .author
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
            body: form.body.clone().unwrap_or_default(),
        }
    }

    /// Apply the fields present in `form` on top of an existing article.
    pub fn merge(article: &Article, form: &ArticleForm) -> Self {
        Self {
            title: form.title.clone().unwrap_or_else(|| article.title.clone()),
            author: form
                .author
                .clone()
                .unwrap_or_else(|| article.author.clone()),
            body: form.body.clone().unwrap_or_else(|| article.body.clone()),
        }
    }

    /// Check that every field is non-empty.
    ///
    /// All failing fields are reported, in form order.
    pub fn validate(&self) -> Result<(), errors::ValidationError> {
        let errors: Vec<_> = [
            (Field::Title, &self.title),
            (Field::Author, &self.author),
            (Field::Body, &self.body),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| errors::FieldError::new(field))
        .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors::ValidationError { errors })
        }
    }
}

/// The user-editable fields of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Author,
    Body,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Body => "body",
        }
    }

    /// The message shown to the user when the field is missing or empty.
    pub fn missing_message(&self) -> &'static str {
        match self {
            Field::Title => "Please provide a title.",
            Field::Author => "Please provide an author.",
            Field::Body => "Please provide some text.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
