use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde::de::value::{Error as ValueError, MapDeserializer};

use super::errors::{DecodeError, ExtractPathParamsError, InvalidUtf8InPathParam};

/// The raw, percent-encoded path parameters captured by the router
/// for the incoming request.
///
/// E.g. `{ "id": "12" }` for `/articles/12/edit` matched against
/// `/articles/{id}/edit`.
///
/// Parameter names live as long as the router, while their values are tied
/// to the lifetime of the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RawPathParams<'server, 'request>(Vec<(&'server str, &'request str)>);

impl<'server, 'request> RawPathParams<'server, 'request> {
    /// The number of captured parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the matched route has no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the captured `(name, raw value)` pairs, in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&'server str, EncodedParamValue<'request>)> + '_ {
        self.0
            .iter()
            .map(|&(id, value)| (id, EncodedParamValue(value)))
    }

    /// Get the raw value of the parameter named `key`, if captured.
    pub fn get(&self, key: &str) -> Option<EncodedParamValue<'request>> {
        self.0
            .iter()
            .find(|(id, _)| *id == key)
            .map(|&(_, value)| EncodedParamValue(value))
    }
}

impl<'server, 'request> From<matchit::Params<'server, 'request>>
    for RawPathParams<'server, 'request>
{
    fn from(params: matchit::Params<'server, 'request>) -> Self {
        Self(params.iter().collect())
    }
}

/// A percent-encoded path parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedParamValue<'request>(&'request str);

impl<'request> EncodedParamValue<'request> {
    /// The raw value, as it appears in the request path.
    pub fn as_str(&self) -> &'request str {
        self.0
    }

    /// Percent-decode the value.
    ///
    /// It borrows from the request path unless the value contains
    /// percent-encoded sequences.
    pub fn decode(&self) -> Result<Cow<'request, str>, DecodeError> {
        percent_decode_str(self.0)
            .decode_utf8()
            .map_err(|e| DecodeError {
                invalid_raw_segment: self.0.to_owned(),
                source: e,
            })
    }
}

/// Extract (typed) path parameters from the path of an incoming request.
///
/// The name of each field must match the name of a path parameter in the
/// route pattern. Every parameter is percent-decoded before deserialization.
///
/// ```rust
/// use blog_core::http::PathParams;
///
/// #[derive(serde::Deserialize)]
/// pub struct ArticlePath {
///     // Matches `{id}` in `/articles/{id}`.
///     id: String,
/// }
///
/// pub fn article_id(params: &PathParams<ArticlePath>) -> &str {
///     &params.0.id
/// }
/// ```
#[doc(alias = "RouteParams")]
pub struct PathParams<T>(
    /// The extracted path parameters, deserialized into `T`.
    pub T,
);

impl<T> PathParams<T> {
    pub fn extract<'server, 'request>(
        params: &RawPathParams<'server, 'request>,
    ) -> Result<Self, ExtractPathParamsError>
    where
        T: Deserialize<'request>,
        'server: 'request,
    {
        let mut decoded_params: Vec<(&'server str, Cow<'request, str>)> =
            Vec::with_capacity(params.len());
        for (id, value) in params.iter() {
            let decoded_value = value.decode().map_err(|e| {
                let DecodeError {
                    invalid_raw_segment,
                    source,
                } = e;
                InvalidUtf8InPathParam {
                    invalid_key: id.into(),
                    invalid_raw_segment,
                    source,
                }
            })?;
            decoded_params.push((id, decoded_value));
        }
        let deserializer: MapDeserializer<'request, _, ValueError> = MapDeserializer::new(
            decoded_params
                .into_iter()
                .map(|(id, value)| (id, value.into_owned())),
        );
        T::deserialize(deserializer)
            .map_err(ExtractPathParamsError::PathDeserializationError)
            .map(PathParams)
    }
}
