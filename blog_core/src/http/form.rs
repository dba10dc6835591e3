use http::HeaderMap;
use serde::Deserialize;

use super::errors::{
    ExtractUrlEncodedBodyError, MissingUrlEncodedContentType, UrlEncodedBodyDeserializationError,
    UrlEncodedContentTypeMismatch,
};
use super::{BufferedBody, RequestHead};

#[doc(alias = "Form")]
#[derive(Debug)]
/// Parse the body of an incoming request as an `application/x-www-form-urlencoded` form,
/// the encoding used by browsers when submitting an HTML `<form>`.
///
/// # Example
///
/// ```rust
/// use blog_core::http::UrlEncodedBody;
///
/// #[derive(serde::Deserialize)]
/// pub struct Comment {
///     author: String,
///     text: String,
/// }
///
/// pub fn describe(body: &UrlEncodedBody<Comment>) -> String {
///     format!("{} wrote: {}", body.0.author, body.0.text)
/// }
/// ```
///
/// # Body size limit
///
/// The body is buffered in memory before deserialization, via [`BufferedBody`],
/// which enforces the configured size limit.
pub struct UrlEncodedBody<T>(pub T);

impl<T> UrlEncodedBody<T> {
    pub fn extract<'head, 'body>(
        request_head: &'head RequestHead,
        buffered_body: &'body BufferedBody,
    ) -> Result<Self, ExtractUrlEncodedBodyError>
    where
        'head: 'body,
        T: Deserialize<'body>,
    {
        check_urlencoded_content_type(&request_head.headers)?;

        let bytes = buffered_body.bytes.as_ref();
        let deserializer = serde_html_form::Deserializer::new(form_urlencoded::parse(bytes));
        let body = serde_path_to_error::deserialize(deserializer)
            .map_err(|e| UrlEncodedBodyDeserializationError { source: e })?;
        Ok(UrlEncodedBody(body))
    }
}

/// Check that the `Content-Type` header is set to `application/x-www-form-urlencoded`.
///
/// Return an error otherwise.
fn check_urlencoded_content_type(headers: &HeaderMap) -> Result<(), ExtractUrlEncodedBodyError> {
    let Some(content_type) = headers.get(http::header::CONTENT_TYPE) else {
        return Err(MissingUrlEncodedContentType.into());
    };
    let Ok(content_type) = content_type.to_str() else {
        return Err(MissingUrlEncodedContentType.into());
    };

    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return Err(UrlEncodedContentTypeMismatch {
            actual: content_type.to_string(),
        }
        .into());
    };

    let is_urlencoded_content_type =
        mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED;
    if !is_urlencoded_content_type {
        return Err(UrlEncodedContentTypeMismatch {
            actual: content_type.to_string(),
        }
        .into());
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::http::{BufferedBody, RequestHead, UrlEncodedBody};

    fn form_request_head() -> RequestHead {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded".parse().unwrap(),
        );
        RequestHead {
            headers,
            method: http::Method::POST,
            version: http::Version::HTTP_11,
            target: "/articles".parse().unwrap(),
        }
    }

    #[test]
    fn missing_content_type() {
        let headers = http::HeaderMap::new();
        let err = super::check_urlencoded_content_type(&headers).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"The `Content-Type` header is missing. This endpoint expects requests with a `Content-Type` header set to `application/x-www-form-urlencoded`");
    }

    #[test]
    fn content_type_is_not_valid_mime() {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "hello world".parse().unwrap());

        let err = super::check_urlencoded_content_type(&headers).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"The `Content-Type` header was set to `hello world`. This endpoint expects requests with a `Content-Type` header set to `application/x-www-form-urlencoded`");
    }

    #[test]
    fn content_type_is_not_form() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );

        let err = super::check_urlencoded_content_type(&headers).unwrap_err();
        assert_eq!(
            err.into_response().status(),
            http::StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn form_content_type_with_charset() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded; charset=utf-8"
                .parse()
                .unwrap(),
        );

        let outcome = super::check_urlencoded_content_type(&headers);
        assert!(outcome.is_ok());
    }

    #[test]
    fn percent_encoded_fields_are_decoded() {
        #[derive(serde::Deserialize, Debug)]
        struct BodySchema {
            title: String,
            body: String,
        }

        let buffered_body = BufferedBody {
            bytes: "title=Caf%C3%A9+time&body=a%26b".into(),
        };
        let outcome: UrlEncodedBody<BodySchema> =
            UrlEncodedBody::extract(&form_request_head(), &buffered_body).unwrap();

        assert_eq!(outcome.0.title, "Café time");
        assert_eq!(outcome.0.body, "a&b");
    }

    #[test]
    /// Let's check the error quality when the request body is missing
    /// a required field.
    fn missing_form_field() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct BodySchema {
            title: String,
            author: String,
        }

        let buffered_body = BufferedBody {
            bytes: "title=Hello".into(),
        };
        let outcome: Result<UrlEncodedBody<BodySchema>, _> =
            UrlEncodedBody::extract(&form_request_head(), &buffered_body);

        let err = outcome.unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r###"
        Failed to deserialize the body as a urlencoded form.
        missing field `author`
        "###);
        assert_eq!(err.into_response().status(), http::StatusCode::BAD_REQUEST);
    }
}
