use http::HeaderValue;
use std::fmt::Formatter;
use uuid::Uuid;

/// A unique identifier generated for each incoming request.
///
/// It is attached to the request's root span and sent back to the caller
/// via the `X-Request-Id` response header.
#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ServerRequestId(Uuid);

impl ServerRequestId {
    /// Generate a new request id using a UUID v7, i.e. a random number
    /// and the current (UNIX) timestamp.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Access the underlying UUID.
    pub fn inner(&self) -> Uuid {
        self.0
    }

    /// Return a hyphenated representation of [`ServerRequestId`] to be used
    /// as a [`HeaderValue`].
    pub fn header_value(&self) -> HeaderValue {
        // A hyphenated UUID is plain ASCII, always a valid header value.
        HeaderValue::from_str(&self.to_string()).unwrap_or(HeaderValue::from_static("unknown"))
    }
}

impl From<Uuid> for ServerRequestId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ServerRequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}
