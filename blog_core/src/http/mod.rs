//! Process incoming HTTP requests and assemble outgoing responses.
//!
//! # Overview
//!
//! Request data is extracted in layers:
//!
//! 1. [`RequestHead`] holds everything that's transmitted ahead of the body.
//! 2. [`BufferedBody`] buffers the raw incoming body in memory, enforcing
//!    the configured [`BodySizeLimit`].
//! 3. [`UrlEncodedBody`] deserializes a buffered `application/x-www-form-urlencoded`
//!    body into a structured type.
//!
//! Path parameters are available via [`PathParams`], once the router has matched
//! the incoming request against one of the registered routes.
pub use body::{BodySizeLimit, BufferedBody};
pub use form::UrlEncodedBody;
pub use path::{PathParams, RawPathParams};
pub use request_head::RequestHead;
pub use request_id::ServerRequestId;
pub use response::{Html, Response, TypedBody};

mod body;
pub mod errors;
mod form;
mod path;
mod request_head;
mod request_id;
mod response;
