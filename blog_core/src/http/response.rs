use bytes::Bytes;
use http::header::{CONTENT_TYPE, InvalidHeaderValue, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

/// An HTTP response, ready to be sent back to the caller.
///
/// The body is fully buffered in memory: every view rendered by this
/// application fits comfortably in a single buffer.
///
/// Use one of the status-specific constructors (e.g. [`Response::ok`]) and
/// chain the builder-style methods to customize it:
///
/// ```rust
/// use blog_core::http::{Html, Response};
///
/// let response = Response::ok().set_typed_body(Html::from("<h1>Hello</h1>"));
/// assert_eq!(response.status(), http::StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Bytes>,
}

impl Response {
    /// Build a new [`Response`] with the given status code and an empty body.
    pub fn new(status: StatusCode) -> Self {
        let mut inner = http::Response::new(Bytes::new());
        *inner.status_mut() = status;
        Self { inner }
    }

    /// `200 OK`.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// `302 Found`, pointing the caller at `location`.
    pub fn redirect(location: &str) -> Result<Self, InvalidHeaderValue> {
        let location = HeaderValue::from_str(location)?;
        Ok(Self::new(StatusCode::FOUND).insert_header(LOCATION, location))
    }

    /// `400 Bad Request`.
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// `404 Not Found`.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// `405 Method Not Allowed`.
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// `413 Payload Too Large`.
    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE)
    }

    /// `415 Unsupported Media Type`.
    pub fn unsupported_media_type() -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE)
    }

    /// `500 Internal Server Error`.
    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Insert a header, replacing any previous value for the same name.
    pub fn insert_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner.headers_mut().insert(name, value);
        self
    }

    /// Set the response body.
    ///
    /// The `Content-Type` header is set according to the [`TypedBody`] implementation.
    pub fn set_typed_body<B>(mut self, body: B) -> Self
    where
        B: TypedBody,
    {
        self.inner
            .headers_mut()
            .insert(CONTENT_TYPE, body.content_type());
        *self.inner.body_mut() = body.body();
        self
    }

    /// The status code of this response.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// The headers of this response.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The (buffered) body of this response.
    pub fn body_bytes(&self) -> &Bytes {
        self.inner.body()
    }
}

impl From<Response> for http::Response<Full<Bytes>> {
    fn from(response: Response) -> Self {
        response.inner.map(Full::new)
    }
}

/// A body type that knows its own `Content-Type`.
pub trait TypedBody {
    /// The value of the `Content-Type` header for this body.
    fn content_type(&self) -> HeaderValue;

    /// The raw bytes of this body.
    fn body(self) -> Bytes;
}

impl TypedBody for String {
    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_static("text/plain; charset=utf-8")
    }

    fn body(self) -> Bytes {
        self.into()
    }
}

impl TypedBody for &'static str {
    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_static("text/plain; charset=utf-8")
    }

    fn body(self) -> Bytes {
        Bytes::from_static(self.as_bytes())
    }
}

/// An HTML document, served with `Content-Type: text/html; charset=utf-8`.
#[derive(Debug, Clone)]
pub struct Html(String);

impl From<String> for Html {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&'static str> for Html {
    fn from(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

impl TypedBody for Html {
    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_static("text/html; charset=utf-8")
    }

    fn body(self) -> Bytes {
        self.0.into()
    }
}
