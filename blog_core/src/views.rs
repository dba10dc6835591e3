//! Server-side HTML rendering.
//!
//! Every page is rendered in two steps: the page-specific template first, then
//! the shared layout around it. User-provided content is escaped by the
//! templates themselves, via liquid's `escape` filter.
use liquid::partials::{EagerCompiler, InMemorySource};
use liquid::{Parser, ParserBuilder, Template};
use serde::Serialize;

use crate::articles::errors::ValidationError;
use crate::articles::{Article, ArticleDraft, ArticleId};
use crate::http::Html;

type Partials = EagerCompiler<InMemorySource>;

/// The compiled templates for every page of the application.
///
/// Templates are parsed once, when the application starts.
pub struct Views {
    layout: Template,
    index: Template,
    new: Template,
    edit: Template,
    show: Template,
    delete: Template,
}

impl std::fmt::Debug for Views {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Views").finish_non_exhaustive()
    }
}

impl Views {
    /// Parse all templates.
    pub fn new() -> Result<Self, liquid::Error> {
        let mut partials = Partials::empty();
        partials.add("form", include_str!("../templates/form.liquid"));
        let parser = ParserBuilder::with_stdlib().partials(partials).build()?;

        let parse = |source: &str| -> Result<Template, liquid::Error> { parser.parse(source) };
        Ok(Self {
            layout: parse(include_str!("../templates/layout.liquid"))?,
            index: parse(include_str!("../templates/index.liquid"))?,
            new: parse(include_str!("../templates/new.liquid"))?,
            edit: parse(include_str!("../templates/edit.liquid"))?,
            show: parse(include_str!("../templates/show.liquid"))?,
            delete: parse(include_str!("../templates/delete.liquid"))?,
        })
    }

    /// The list of all articles.
    pub fn index(&self, articles: &[Article]) -> Result<Html, liquid::Error> {
        let articles: Vec<_> = articles.iter().map(ArticleView::from).collect();
        let content = render(&self.index, &IndexPage { articles })?;
        self.page("simpleBlog!", content)
    }

    /// The creation form, pre-filled with `draft`.
    ///
    /// `errors` is set when re-rendering a submission that failed validation.
    pub fn new_article(
        &self,
        draft: &ArticleDraft,
        errors: Option<&ValidationError>,
    ) -> Result<Html, liquid::Error> {
        let page = FormPage {
            action: "/articles".into(),
            submit: "Create Article",
            article: FormFields::new(None, draft),
            errors: error_messages(errors),
        };
        let content = render(&self.new, &page)?;
        self.page("New Article", content)
    }

    /// The edit form for the article with the given `id`.
    ///
    /// `errors` is set when re-rendering a submission that failed validation.
    pub fn edit_article(
        &self,
        id: ArticleId,
        draft: &ArticleDraft,
        errors: Option<&ValidationError>,
    ) -> Result<Html, liquid::Error> {
        let page = FormPage {
            action: format!("/articles/{id}/edit"),
            submit: "Update Article",
            article: FormFields::new(Some(id), draft),
            errors: error_messages(errors),
        };
        let content = render(&self.edit, &page)?;
        self.page("Edit Article", content)
    }

    /// A single article.
    pub fn show_article(&self, article: &Article) -> Result<Html, liquid::Error> {
        let content = render(
            &self.show,
            &ArticlePage {
                article: ArticleView::from(article),
            },
        )?;
        self.page(&article.title, content)
    }

    /// The confirmation page shown before deleting an article.
    pub fn delete_article(&self, article: &Article) -> Result<Html, liquid::Error> {
        let content = render(
            &self.delete,
            &ArticlePage {
                article: ArticleView::from(article),
            },
        )?;
        self.page("Delete Article", content)
    }

    fn page(&self, title: &str, content: String) -> Result<Html, liquid::Error> {
        render(&self.layout, &Layout { title, content }).map(Html::from)
    }
}

fn render<T: Serialize>(template: &Template, context: &T) -> Result<String, liquid::Error> {
    let globals = liquid::to_object(context)?;
    template.render(&globals)
}

fn error_messages(errors: Option<&ValidationError>) -> Vec<String> {
    errors
        .map(|e| e.errors().iter().map(|e| e.message.clone()).collect())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct Layout<'a> {
    title: &'a str,
    content: String,
}

#[derive(Serialize)]
struct IndexPage {
    articles: Vec<ArticleView>,
}

#[derive(Serialize)]
struct ArticlePage {
    article: ArticleView,
}

#[derive(Serialize)]
struct FormPage<'a> {
    action: String,
    submit: &'static str,
    article: FormFields<'a>,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct ArticleView {
    id: i64,
    title: String,
    author: String,
    body: String,
    published_at: String,
    short_description: String,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.inner(),
            title: article.title.clone(),
            author: article.author.clone(),
            body: article.body.clone(),
            published_at: article.published_at(),
            short_description: article.short_description().into_owned(),
        }
    }
}

#[derive(Serialize)]
struct FormFields<'a> {
    id: Option<i64>,
    title: &'a str,
    author: &'a str,
    body: &'a str,
}

impl<'a> FormFields<'a> {
    fn new(id: Option<ArticleId>, draft: &'a ArticleDraft) -> Self {
        Self {
            id: id.map(|id| id.inner()),
            title: &draft.title,
            author: &draft.author,
            body: &draft.body,
        }
    }
}
