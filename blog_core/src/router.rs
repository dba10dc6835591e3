//! Dispatch requests to the appropriate handler.
use std::sync::Arc;

use anyhow::Context;
use http::header::{ALLOW, HeaderName};
use http::{HeaderValue, Method};
use tracing::Instrument;
use tracing_log_error::log_error;

use crate::Error;
use crate::articles::{ArticleForm, ArticleStore, SqliteArticleStore};
use crate::configuration::AppConfig;
use crate::http::{
    BodySizeLimit, BufferedBody, PathParams, RawPathParams, RequestHead, Response,
    ServerRequestId, UrlEncodedBody,
};
use crate::routes::{self, ArticlePath};
use crate::server::{Server, ServerHandle};
use crate::telemetry::{self, RootSpan};
use crate::views::Views;

/// The header used to send the [`ServerRequestId`] back to the caller.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The registered route paths, indexed by route id.
const ROUTES: [&str; 7] = [
    "/",
    "/api/ping",
    "/articles",
    "/articles/new",
    "/articles/{id}",
    "/articles/{id}/edit",
    "/articles/{id}/delete",
];

/// Everything the request handlers need, built once when the application starts.
#[derive(Debug, Clone)]
pub struct ApplicationState {
    router: Arc<Router>,
    store: ArticleStore,
    views: Arc<Views>,
    body_size_limit: BodySizeLimit,
}

impl ApplicationState {
    /// Assemble the application state around an existing article store.
    pub fn new(store: ArticleStore, body_size_limit: BodySizeLimit) -> Result<Self, anyhow::Error> {
        Ok(Self {
            router: Arc::new(Router::new().context("Failed to build the router")?),
            store,
            views: Arc::new(Views::new().context("Failed to parse the HTML templates")?),
            body_size_limit,
        })
    }

    /// The article store used by the request handlers.
    pub fn store(&self) -> &ArticleStore {
        &self.store
    }
}

/// Connect to the database, make sure its schema is up to date and
/// build the application state.
pub async fn build_application_state(config: &AppConfig) -> Result<ApplicationState, anyhow::Error> {
    let pool = config
        .database
        .get_pool()
        .await
        .context("Failed to connect to the database")?;
    let backend = SqliteArticleStore::new(pool);
    backend
        .migrate()
        .await
        .context("Failed to create the articles table")?;
    ApplicationState::new(backend.into(), config.body_size_limit.into())
}

/// Start serving requests.
pub fn run(server: Server, application_state: ApplicationState) -> ServerHandle {
    server.serve(route_request::<hyper::body::Incoming>, application_state)
}

struct Router {
    router: matchit::Router<u32>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("routes", &ROUTES).finish()
    }
}

impl Router {
    fn new() -> Result<Self, matchit::InsertError> {
        let mut router = matchit::Router::new();
        for (route_id, path) in (0u32..).zip(ROUTES) {
            router.insert(path, route_id)?;
        }
        Ok(Self { router })
    }
}

/// The HTTP methods supported by each route.
fn allowed_methods(route_id: u32) -> &'static [Method] {
    match route_id {
        2 | 5 | 6 => &[Method::GET, Method::POST],
        _ => &[Method::GET],
    }
}

/// Route an incoming request to the matching handler and assemble the response.
///
/// Every request gets its own [`ServerRequestId`], returned to the caller via
/// the `X-Request-Id` header, and its own [`RootSpan`].
pub async fn route_request<B>(request: http::Request<B>, state: ApplicationState) -> Response
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let request_id = ServerRequestId::generate();
    let (parts, body) = request.into_parts();
    let request_head: RequestHead = parts.into();

    let matched = state.router.router.at(request_head.path()).ok();
    let route_id = matched.as_ref().map(|m| *m.value);
    let raw_params: RawPathParams = matched.map(|m| m.params.into()).unwrap_or_default();

    let matched_route = route_id.and_then(|id| ROUTES.get(id as usize).copied());
    let root_span = telemetry::root_span(&request_head, matched_route, request_id);

    let response = dispatch(route_id, &raw_params, &request_head, body, &state, &root_span)
        .instrument(root_span.inner().clone())
        .await;
    telemetry::response_logger(response, &root_span)
        .insert_header(X_REQUEST_ID, request_id.header_value())
}

async fn dispatch<B>(
    route_id: Option<u32>,
    raw_params: &RawPathParams<'_, '_>,
    request_head: &RequestHead,
    body: B,
    state: &ApplicationState,
    root_span: &RootSpan,
) -> Response
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(route_id) = route_id else {
        return Response::not_found();
    };
    let store = &state.store;
    let views = &*state.views;
    let limit = state.body_size_limit;

    let outcome = match (route_id, &request_head.method) {
        (0, &Method::GET) => Ok(routes::home::get()),
        (1, &Method::GET) => Ok(routes::ping::get()),
        (2, &Method::GET) => routes::list_articles::get(store, views).await,
        (2, &Method::POST) => {
            let body = match extract_form(request_head, body, limit).await {
                Ok(body) => body,
                Err(response) => return response,
            };
            routes::create_article::post(body, store, views).await
        }
        (3, &Method::GET) => routes::new_article::get(views),
        (4, &Method::GET) => {
            let params = match extract_article_path(raw_params) {
                Ok(params) => params,
                Err(response) => return response,
            };
            routes::get_article::get(params, store, views).await
        }
        (5, &Method::GET) => {
            let params = match extract_article_path(raw_params) {
                Ok(params) => params,
                Err(response) => return response,
            };
            routes::edit_article::get(params, store, views).await
        }
        (5, &Method::POST) => {
            let params = match extract_article_path(raw_params) {
                Ok(params) => params,
                Err(response) => return response,
            };
            let body = match extract_form(request_head, body, limit).await {
                Ok(body) => body,
                Err(response) => return response,
            };
            routes::edit_article::post(params, body, store, views).await
        }
        (6, &Method::GET) => {
            let params = match extract_article_path(raw_params) {
                Ok(params) => params,
                Err(response) => return response,
            };
            routes::delete_article::get(params, store, views).await
        }
        (6, &Method::POST) => {
            let params = match extract_article_path(raw_params) {
                Ok(params) => params,
                Err(response) => return response,
            };
            routes::delete_article::post(params, store).await
        }
        (route_id, _) => return method_not_allowed(allowed_methods(route_id)),
    };
    outcome.unwrap_or_else(|e| handle_error(&e, root_span))
}

/// Log the error and hide its details from the caller.
fn handle_error(e: &Error, root_span: &RootSpan) -> Response {
    telemetry::error_logger(e, root_span);
    e.to_response()
}

/// `405 Method Not Allowed`, listing the supported methods in the `Allow` header.
fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(",");
    match HeaderValue::from_str(&allow) {
        Ok(value) => Response::method_not_allowed().insert_header(ALLOW, value),
        Err(_) => Response::method_not_allowed(),
    }
}

fn extract_article_path(raw_params: &RawPathParams) -> Result<PathParams<ArticlePath>, Response> {
    PathParams::extract(raw_params).map_err(|e| {
        log_error!(e, level: tracing::Level::INFO, "Failed to extract the path parameters");
        e.into_response()
    })
}

async fn extract_form<B>(
    request_head: &RequestHead,
    body: B,
    limit: BodySizeLimit,
) -> Result<UrlEncodedBody<ArticleForm>, Response>
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let buffered = BufferedBody::extract(request_head, body, limit)
        .await
        .map_err(|e| {
            log_error!(e, level: tracing::Level::INFO, "Failed to buffer the request body");
            e.into_response()
        })?;
    UrlEncodedBody::extract(request_head, &buffered).map_err(|e| {
        log_error!(e, level: tracing::Level::INFO, "Failed to parse the submitted form");
        e.into_response()
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;
    use http::header::{ALLOW, CONTENT_TYPE, LOCATION};
    use http_body_util::Full;
    use ubyte::ToByteUnit;

    use super::{ApplicationState, X_REQUEST_ID, route_request};
    use crate::articles::{ArticleForm, ArticleStore, InMemoryArticleStore};
    use crate::http::{BodySizeLimit, Response};

    fn state() -> ApplicationState {
        ApplicationState::new(
            ArticleStore::new(InMemoryArticleStore::new()),
            BodySizeLimit::default(),
        )
        .unwrap()
    }

    async fn get(state: &ApplicationState, uri: &str) -> Response {
        let request = http::Request::get(uri).body(Full::new(Bytes::new())).unwrap();
        route_request(request, state.clone()).await
    }

    async fn post_form(state: &ApplicationState, uri: &str, form: &'static str) -> Response {
        let request = http::Request::post(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(form.as_bytes())))
            .unwrap();
        route_request(request, state.clone()).await
    }

    fn body(response: &Response) -> &str {
        std::str::from_utf8(response.body_bytes()).unwrap()
    }

    #[test]
    fn every_route_can_be_registered() {
        super::Router::new().unwrap();
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let response = get(&state(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body_bytes().is_empty());
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn unsupported_methods_list_the_allowed_ones() {
        let request = http::Request::delete("/articles")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = route_request(request, state()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET,POST");

        let request = http::Request::post("/articles/new")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = route_request(request, state()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET");
    }

    #[tokio::test]
    async fn root_redirects_to_the_article_list() {
        let response = get(&state(), "/").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/articles");
    }

    #[tokio::test]
    async fn ping() {
        assert_eq!(get(&state(), "/api/ping").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn new_is_not_mistaken_for_an_id() {
        let response = get(&state(), "/articles/new").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("<title>New Article</title>"));
    }

    #[tokio::test]
    async fn non_integer_ids_are_not_found() {
        let state = state();
        for uri in ["/articles/abc", "/articles/abc/edit", "/articles/1.5/delete"] {
            let response = get(&state, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn create_then_show() {
        let state = state();
        let response = post_form(&state, "/articles", "title=Hello&author=Ada&body=World").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/articles/1");

        let response = get(&state, location).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("<title>Hello</title>"));
        assert!(body(&response).contains("By Ada"));
    }

    #[tokio::test]
    async fn invalid_submissions_are_shown_again() {
        let state = state();
        let response = post_form(&state, "/articles", "title=&author=Ada&body=World").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("Please provide a title."));
        assert!(body(&response).contains(r#"value="Ada""#));
        assert!(state.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn an_empty_author_is_not_replaced_by_the_default() {
        let state = state();
        let response = post_form(&state, "/articles", "title=Hello&author=&body=World").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("Please provide an author."));
        assert!(state.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_fields_fail_an_edit() {
        let state = state();
        let article = state
            .store()
            .create(&ArticleForm {
                title: Some("Title".into()),
                author: Some("Ada".into()),
                body: Some("Body".into()),
            })
            .await
            .unwrap();
        let edit_uri = format!("/articles/{}/edit", article.id);

        let response = post_form(&state, &edit_uri, "body=").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("Please provide some text."));
        // Fields missing from the submission keep their stored value.
        assert!(body(&response).contains(r#"value="Title""#));
        assert!(body(&response).contains(&format!(r#"action="{edit_uri}""#)));

        let response = post_form(&state, &edit_uri, "title=&author=Grace").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("Please provide a title."));
        assert!(body(&response).contains(r#"value="Grace""#));

        assert_eq!(state.store().find(article.id).await.unwrap().unwrap(), article);
    }

    #[tokio::test]
    async fn malformed_forms_are_rejected() {
        let state = state();
        let request = http::Request::post("/articles")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let response = route_request(request, state.clone()).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let state = ApplicationState::new(
            ArticleStore::new(InMemoryArticleStore::new()),
            BodySizeLimit::Enabled {
                max_size: 16.bytes(),
            },
        )
        .unwrap();
        let response = post_form(&state, "/articles", "title=Hello&author=Ada&body=World").await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn edit_and_delete() {
        let state = state();
        let article = state
            .store()
            .create(&ArticleForm {
                title: Some("Title".into()),
                author: Some("Ada".into()),
                body: Some("Body".into()),
            })
            .await
            .unwrap();
        let edit_uri = format!("/articles/{}/edit", article.id);
        let delete_uri = format!("/articles/{}/delete", article.id);

        let response = get(&state, &edit_uri).await;
        assert!(body(&response).contains("<title>Edit Article</title>"));

        let response = post_form(&state, &edit_uri, "title=&author=Ada&body=Body").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(&response).contains("Please provide a title."));
        assert_eq!(state.store().find(article.id).await.unwrap().unwrap(), article);

        let response = post_form(&state, &edit_uri, "title=Edited&author=Ada&body=Body").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            format!("/articles/{}", article.id).as_str()
        );

        let response = get(&state, &delete_uri).await;
        assert!(body(&response).contains("<title>Delete Article</title>"));

        let response = post_form(&state, &delete_uri, "").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/articles");

        let response = post_form(&state, &delete_uri, "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get(&state, &format!("/articles/{}", article.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
