use crate::http::Response;
use std::fmt;

/// The error type returned by request handlers: an opaque wrapper around
/// whatever concrete error caused the failure.
///
/// Handlers deal with the failures they know how to recover from (validation
/// errors, missing records) and propagate everything else as an [`Error`].
/// The router catches it, reports it through
/// [`error_logger`](crate::telemetry::error_logger) and answers with
/// [`Error::to_response`].
///
/// # Implementation details
///
/// It's a thin shim over `Box<dyn std::error::Error + Send + Sync>`.
#[derive(Debug)]
pub struct Error {
    inner: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Create a new [`Error`] from a boxable error.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            inner: error.into(),
        }
    }

    /// Convert [`Error`] back into the underlying boxed error.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.inner
    }

    /// Return a reference to the underlying boxed error.
    pub fn inner_ref(&self) -> &(dyn std::error::Error + Send + Sync) {
        &*self.inner
    }

    /// Return an opaque `500 Internal Server Error` to the caller.
    ///
    /// The details of the failure are never sent back: they end up in the logs.
    pub fn to_response(&self) -> Response {
        Response::internal_server_error()
            .set_typed_body("Something went wrong when trying to process the request")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.inner)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(e)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use http::StatusCode;

    #[test]
    fn the_response_does_not_leak_error_details() {
        let e = Error::new(anyhow::anyhow!("connection refused by db.internal:5432"));
        let response = e.to_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = std::str::from_utf8(response.body_bytes()).unwrap();
        assert!(!body.contains("db.internal"));
    }
}
