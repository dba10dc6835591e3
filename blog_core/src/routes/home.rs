use http::HeaderValue;
use http::header::LOCATION;
use http::StatusCode;

use crate::http::Response;

/// Send visitors of the root path to the list of articles.
pub fn get() -> Response {
    Response::new(StatusCode::FOUND).insert_header(LOCATION, HeaderValue::from_static("/articles"))
}
