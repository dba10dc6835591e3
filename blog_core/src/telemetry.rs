//! Request-level telemetry: the root span, the response logger and the error logger.
//!
//! Field names follow [OpenTelemetry's semantic convention](https://opentelemetry.io/docs/specs/semconv/)
//! whenever possible.
use http::{Method, Version};
use tracing::Value;
use tracing_log_error::fields::{
    ERROR_DETAILS, ERROR_MESSAGE, ERROR_SOURCE_CHAIN, error_details, error_message,
    error_source_chain,
};
use tracing_log_error::log_error;

use crate::http::{RequestHead, Response, ServerRequestId};

pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
/// Not part of OpenTelemetry's semantic convention.
pub const HTTP_REQUEST_SERVER_ID: &str = "http.request.server_id";
pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
pub const HTTP_ROUTE: &str = "http.route";
pub const NETWORK_PROTOCOL_VERSION: &str = "network.protocol.version";
pub const URL_PATH: &str = "url.path";
pub const URL_QUERY: &str = "url.query";
pub const USER_AGENT_ORIGINAL: &str = "user_agent.original";

/// The top-level *logical* [`tracing::Span`] for an incoming request.
///
/// It is created as soon as the request has been routed, and it's enriched
/// along the way: with the response status code by [`response_logger`] and,
/// if processing failed, with the error details by [`error_logger`].
#[derive(Debug, Clone)]
pub struct RootSpan(tracing::Span);

impl RootSpan {
    /// Access the underlying span.
    pub fn inner(&self) -> &tracing::Span {
        &self.0
    }

    /// Record a value on one of the fields declared in [`root_span`].
    pub fn record<V: Value>(&self, field: &'static str, value: V) -> &Self {
        self.0.record(field, value);
        self
    }
}

/// Construct a new root span for the given request.
///
/// `matched_route` is the path pattern that matched the request, if any.
pub fn root_span(
    request_head: &RequestHead,
    matched_route: Option<&str>,
    request_id: ServerRequestId,
) -> RootSpan {
    // `{ <expr> }` makes `tracing` evaluate the constant as the field name,
    // e.g. "http.request.method" rather than "HTTP_REQUEST_METHOD".
    let span = tracing::info_span!(
        "HTTP request",
        { HTTP_REQUEST_METHOD } = http_request_method(&request_head.method),
        { HTTP_REQUEST_SERVER_ID } = tracing::field::display(request_id),
        { HTTP_ROUTE } = matched_route.unwrap_or_default(),
        { NETWORK_PROTOCOL_VERSION } = network_protocol_version(request_head.version),
        { URL_QUERY } = request_head.target.query().unwrap_or_default(),
        { URL_PATH } = request_head.path(),
        { USER_AGENT_ORIGINAL } = user_agent_original(request_head),
        // Populated by `response_logger` and `error_logger`.
        // `tracing` requires every field to be declared upfront.
        { HTTP_RESPONSE_STATUS_CODE } = tracing::field::Empty,
        { ERROR_MESSAGE } = tracing::field::Empty,
        { ERROR_DETAILS } = tracing::field::Empty,
        { ERROR_SOURCE_CHAIN } = tracing::field::Empty,
    );
    RootSpan(span)
}

/// Enrich [`RootSpan`] with information extracted from the outgoing response.
pub fn response_logger(response: Response, root_span: &RootSpan) -> Response {
    root_span.record(HTTP_RESPONSE_STATUS_CODE, response.status().as_u16());
    response
}

/// Log the error that caused a request to fail.
///
/// It emits an error event and attaches information about the error to the root span.
pub fn error_logger(e: &crate::Error, root_span: &RootSpan) {
    log_error!(e, "An error occurred during request handling");
    root_span
        .record(ERROR_MESSAGE, error_message(e))
        .record(ERROR_DETAILS, error_details(e))
        .record(ERROR_SOURCE_CHAIN, error_source_chain(e));
}

/// The canonical representation of the request method.
///
/// Non-canonical methods are logged as `_OTHER`.
fn http_request_method(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::TRACE => "TRACE",
        Method::PATCH => "PATCH",
        Method::CONNECT => "CONNECT",
        Method::HEAD => "HEAD",
        Method::DELETE => "DELETE",
        Method::OPTIONS => "OPTIONS",
        _ => "_OTHER",
    }
}

fn network_protocol_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "_OTHER",
    }
}

fn user_agent_original(request_head: &RequestHead) -> &str {
    request_head
        .header_str(http::header::USER_AGENT)
        .unwrap_or_default()
}
