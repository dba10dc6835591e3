//! Errors that can occur when interacting with the article store.
use std::fmt;

use super::{ArticleDraft, ArticleId, Field};

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
/// The error returned by [`ArticleStore::list`][super::ArticleStore::list].
pub enum ListError {
    /// Something went wrong when retrieving the articles.
    #[error("Something went wrong when listing articles.")]
    Other(#[source] anyhow::Error),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
/// The error returned by [`ArticleStore::find`][super::ArticleStore::find].
pub enum FindError {
    /// Something went wrong when retrieving the article.
    #[error("Something went wrong when loading an article.")]
    Other(#[source] anyhow::Error),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
/// The error returned by [`ArticleStore::create`][super::ArticleStore::create].
pub enum CreateError {
    #[error(transparent)]
    /// The submitted article failed validation. Nothing was stored.
    Validation(#[from] ValidationError),
    /// Something else went wrong when creating a new article.
    #[error("Something went wrong when creating a new article.")]
    Other(#[source] anyhow::Error),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
/// The error returned by [`ArticleStore::update`][super::ArticleStore::update].
pub enum UpdateError {
    #[error("The article was left unchanged")]
    /// The updated article failed validation. Nothing was changed.
    Validation {
        /// The submitted fields applied on top of the stored article.
        draft: ArticleDraft,
        #[source]
        errors: ValidationError,
    },
    #[error(transparent)]
    /// There is no article with the given ID.
    UnknownId(#[from] UnknownIdError),
    /// Something else went wrong when updating the article.
    #[error("Something went wrong when updating an article.")]
    Other(#[source] anyhow::Error),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
/// The error returned by [`ArticleStore::delete`][super::ArticleStore::delete].
pub enum DeleteError {
    #[error(transparent)]
    /// There is no article with the given ID.
    UnknownId(#[from] UnknownIdError),
    /// Something else went wrong when deleting the article.
    #[error("Something went wrong when deleting an article.")]
    Other(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("There is no article with id {id}")]
/// There is no article with the given ID.
pub struct UnknownIdError {
    pub id: ArticleId,
}

/// One or more fields of a submitted article are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    pub(super) errors: Vec<FieldError>,
}

impl ValidationError {
    /// The field-level errors, in form order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The fields that failed validation.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.iter().map(|e| e.field)
    }

    /// The error message for `field`, if it failed validation.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The submitted article is invalid:")?;
        for error in &self.errors {
            write!(f, " {}", error.message)?;
        }
        Ok(())
    }
}

/// A validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub(super) fn new(field: Field) -> Self {
        Self {
            field,
            message: field.missing_message().to_owned(),
        }
    }
}
