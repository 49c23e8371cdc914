//! Response models and response assembly.

use crate::SerializationError;
use crate::headers::Headers;
use crate::model::RestObject;
use crate::serializer::HttpSerializer;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    id: String,
    /// Numeric status code.
    pub status_code: u16,
    /// Whether the status is 2xx or one of the extra successful codes.
    pub is_successful: bool,
    /// Response headers; multiple values are joined with `", "`.
    pub headers: Headers,
    /// Body decoded as UTF-8 (invalid sequences replaced).
    pub string_body: Option<String>,
    /// Raw body bytes.
    pub byte_body: Bytes,
}

impl Response {
    /// Create an empty response carrying the id of its request.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status_code: 0,
            is_successful: false,
            headers: Headers::new(),
            string_body: None,
            byte_body: Bytes::new(),
        }
    }

    /// Get the status code, or `None` before the response is populated.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    /// Get a specific header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the content length if available.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// Get the response body as text.
    pub fn text(&self) -> &str {
        self.string_body.as_deref().unwrap_or_default()
    }
}

impl RestObject for Response {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn string_body(&self) -> Option<&str> {
        self.string_body.as_deref()
    }
}

/// A response whose body was also decoded into `T`.
///
/// Decoding is best effort: when it fails, `body` is `None` and the failure
/// is kept in `deserialization_error`, while status, headers and raw body
/// remain available.
#[derive(Debug, Clone)]
pub struct TypedResponse<T> {
    /// The untyped response.
    pub response: Response,
    /// The decoded body.
    pub body: Option<T>,
    /// Why decoding failed, if it did.
    pub deserialization_error: Option<SerializationError>,
}

impl<T> TypedResponse<T> {
    /// Take the decoded body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// Split into the untyped response and the decode outcome.
    pub fn into_parts(self) -> (Response, Result<Option<T>, SerializationError>) {
        let outcome = match self.deserialization_error {
            Some(error) => Err(error),
            None => Ok(self.body),
        };
        (self.response, outcome)
    }
}

impl<T> Deref for TypedResponse<T> {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}

impl<T> DerefMut for TypedResponse<T> {
    fn deref_mut(&mut self) -> &mut Response {
        &mut self.response
    }
}

impl<T> RestObject for TypedResponse<T> {
    fn id(&self) -> &str {
        self.response.id()
    }

    fn headers(&self) -> &Headers {
        &self.response.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.response.headers
    }

    fn string_body(&self) -> Option<&str> {
        self.response.string_body.as_deref()
    }
}

/// Whether `status` counts as success given the extra success codes.
pub fn is_successful_status(
    status: u16,
    client_codes: &BTreeSet<u16>,
    request_codes: &BTreeSet<u16>,
) -> bool {
    (200..=299).contains(&status)
        || client_codes.contains(&status)
        || request_codes.contains(&status)
}

/// Copy status and headers from the transport response.
pub(crate) fn populate(
    response: &mut Response,
    status: StatusCode,
    headers: &HeaderMap,
    client_codes: &BTreeSet<u16>,
    request_codes: &BTreeSet<u16>,
) {
    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        response.headers.insert(name.as_str(), value);
    }

    response.status_code = status.as_u16();
    response.is_successful =
        is_successful_status(response.status_code, client_codes, request_codes);
}

/// Store the body read from the transport, deriving the text form from the
/// same bytes.
pub(crate) fn set_body(response: &mut Response, body: Bytes) {
    response.string_body = Some(String::from_utf8_lossy(&body).into_owned());
    response.byte_body = body;
}

/// Decode the response text into `T`, capturing any failure.
pub(crate) fn decode_body<T: DeserializeOwned>(
    response: Response,
    serializer: &dyn HttpSerializer,
) -> TypedResponse<T> {
    let text = response.text();
    let (body, deserialization_error) = if text.trim().is_empty() {
        (None, None)
    } else {
        match serializer.deserialize::<T>(text) {
            Ok(body) => (Some(body), None),
            Err(error) => {
                tracing::debug!(
                    id = %response.id(),
                    error = %error,
                    "Response body could not be decoded"
                );
                (None, Some(error))
            }
        }
    };

    TypedResponse {
        response,
        body,
        deserialization_error,
    }
}
