use http::header::HeaderName;
use http::{HeaderMap, Method, Uri, Version};

/// The request line and the headers of an incoming request.
///
/// The body is consumed separately, by [`BufferedBody`](super::BufferedBody).
#[derive(Debug)]
pub struct RequestHead {
    pub method: Method,
    pub target: Uri,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// The path of the request target, without the query string.
    pub fn path(&self) -> &str {
        self.target.path()
    }

    /// The value of the `name` header.
    ///
    /// `None` if the header is missing or if its value is not valid UTF-8.
    pub fn header_str(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

impl From<http::request::Parts> for RequestHead {
    fn from(parts: http::request::Parts) -> Self {
        Self {
            method: parts.method,
            target: parts.uri,
            version: parts.version,
            headers: parts.headers,
        }
    }
}
