//! Request model.

use crate::config::Timeout;
use crate::headers::Headers;
use crate::model::RestObject;
use crate::serializer::HttpSerializer;
use http::Method;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Content type used when a request does not set one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Content type of form-url-encoded bodies.
pub const FORM_URL_ENCODED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Opaque body value, serialized by the effective serializer at send time.
pub type RequestBody = Arc<dyn erased_serde::Serialize + Send + Sync>;

/// Character encoding used for text request bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// 7-bit ASCII; other characters are sent as `?`.
    Ascii,
    /// UTF-16, little endian.
    Utf16,
    /// UTF-16, big endian.
    Utf16BigEndian,
}

impl ContentEncoding {
    /// The `charset` label for this encoding.
    pub fn charset(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "us-ascii",
            Self::Utf16 => "utf-16",
            Self::Utf16BigEndian => "utf-16BE",
        }
    }

    /// Encode text into bytes.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Utf16 => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16BigEndian => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }
}

/// An HTTP request description.
///
/// Owned by the caller and passed to the client by mutable reference. While
/// assembling the transport request the client may rewrite `content_type`
/// (from a `Content-Type` header) and `string_body` (with the serialized
/// `body`), so the request reflects what was actually sent.
#[derive(Clone)]
pub struct Request {
    id: String,
    /// HTTP method, `GET` by default.
    pub method: Method,
    /// Path appended to the client's host, or a full URL.
    pub path: String,
    /// Full URL replacing host and path resolution when non-empty.
    pub url_override: Option<String>,
    /// Request headers; these win over client defaults.
    pub headers: Headers,
    /// Query parameters; these overwrite same-named parameters in the URL.
    pub query_string_parameters: BTreeMap<String, String>,
    /// Form fields; when non-empty they become the body.
    pub form_url_encoded_parameters: BTreeMap<String, String>,
    /// Raw text body.
    pub string_body: Option<String>,
    body: Option<RequestBody>,
    /// Media type for text bodies.
    pub content_type: String,
    /// Encoding for text bodies.
    pub content_encoding: ContentEncoding,
    /// Serializer used instead of the client's.
    pub serializer_override: Option<Arc<dyn HttpSerializer>>,
    /// Statuses treated as successful in addition to 200-299.
    pub additional_successful_status_codes: BTreeSet<u16>,
    /// Timeout used instead of the client's.
    pub timeout_override: Option<Timeout>,
}

impl Request {
    /// Create a `GET` request for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method: Method::GET,
            path: path.into(),
            url_override: None,
            headers: Headers::new(),
            query_string_parameters: BTreeMap::new(),
            form_url_encoded_parameters: BTreeMap::new(),
            string_body: None,
            body: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content_encoding: ContentEncoding::default(),
            serializer_override: None,
            additional_successful_status_codes: BTreeSet::new(),
            timeout_override: None,
        }
    }

    /// Create a request with the given method.
    pub fn with_method(path: impl Into<String>, method: Method) -> Self {
        let mut request = Self::new(path);
        request.method = method;
        request
    }

    /// Create a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::with_method(path, Method::GET)
    }

    /// Create a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::with_method(path, Method::POST)
    }

    /// Create a `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::with_method(path, Method::PUT)
    }

    /// Create a `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::with_method(path, Method::PATCH)
    }

    /// Create a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::with_method(path, Method::DELETE)
    }

    /// The object body, if one is set.
    pub fn body(&self) -> Option<&(dyn erased_serde::Serialize + Send + Sync)> {
        self.body.as_deref()
    }

    /// Whether an object body is set.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Set the object body.
    ///
    /// A `String` or `&'static str` body is also copied into `string_body`
    /// so it is sent verbatim instead of being serialized.
    pub fn set_body<T>(&mut self, body: T)
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        let any: &dyn Any = &body;
        if let Some(text) = any.downcast_ref::<String>() {
            self.string_body = Some(text.clone());
        } else if let Some(text) = any.downcast_ref::<&'static str>() {
            self.string_body = Some((*text).to_string());
        }
        self.body = Some(Arc::new(body));
    }

    /// Remove the object body.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Set the object body.
    pub fn with_body<T>(mut self, body: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        self.set_body(body);
        self
    }

    /// Set a raw text body.
    pub fn with_string_body(mut self, body: impl Into<String>) -> Self {
        self.string_body = Some(body.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a query parameter, replacing one with the same name.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters.insert(key.into(), value.into());
        self
    }

    /// Add a form field.
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_url_encoded_parameters.insert(key.into(), value.into());
        self
    }

    /// Set the media type of text bodies.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the encoding of text bodies.
    pub fn with_content_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.content_encoding = encoding;
        self
    }

    /// Send to this full URL instead of the client host and path.
    pub fn with_url_override(mut self, url: impl Into<String>) -> Self {
        self.url_override = Some(url.into());
        self
    }

    /// Use this serializer instead of the client's.
    pub fn with_serializer(mut self, serializer: Arc<dyn HttpSerializer>) -> Self {
        self.serializer_override = Some(serializer);
        self
    }

    /// Use this timeout instead of the client's.
    pub fn with_timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout_override = Some(timeout.into());
        self
    }

    /// Treat an extra status code as successful.
    pub fn with_success_code(mut self, status: u16) -> Self {
        self.additional_successful_status_codes.insert(status);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.with_header("Authorization", format!("Bearer {token}"))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.into(), p.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.with_header("Authorization", format!("Basic {encoded}"))
    }
}

impl RestObject for Request {
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

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("url_override", &self.url_override)
            .field("headers", &self.headers)
            .field("query_string_parameters", &self.query_string_parameters)
            .field("form_url_encoded_parameters", &self.form_url_encoded_parameters)
            .field("string_body", &self.string_body)
            .field("has_body", &self.body.is_some())
            .field("content_type", &self.content_type)
            .field("content_encoding", &self.content_encoding)
            .field("serializer_override", &self.serializer_override)
            .field(
                "additional_successful_status_codes",
                &self.additional_successful_status_codes,
            )
            .field("timeout_override", &self.timeout_override)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_defaults() {
        let request = Request::new("test");

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(request.content_encoding, ContentEncoding::Utf8);
        assert!(request.query_string_parameters.is_empty());
        assert!(request.form_url_encoded_parameters.is_empty());
        assert!(request.additional_successful_status_codes.is_empty());
        assert!(request.timeout_override.is_none());
        assert!(!request.id().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Request::new("a").id(), Request::new("a").id());
    }

    #[test]
    fn test_string_body_from_string_value() {
        let request = Request::post("test").with_body("testing");
        assert_eq!(request.string_body.as_deref(), Some("testing"));

        let request = Request::post("test").with_body(String::from("owned"));
        assert_eq!(request.string_body.as_deref(), Some("owned"));
    }

    #[test]
    fn test_object_body_does_not_set_string_body() {
        #[derive(Serialize)]
        struct Payload {
            test: &'static str,
        }

        let request = Request::post("test").with_body(Payload { test: "test" });
        assert!(request.has_body());
        assert!(request.string_body.is_none());
    }

    #[test]
    fn test_query_replaces_same_key() {
        let request = Request::get("/get")
            .with_query("param1", "old")
            .with_query("param1", "new");

        assert_eq!(request.query_string_parameters.len(), 1);
        assert_eq!(request.query_string_parameters["param1"], "new");
    }

    #[test]
    fn test_basic_auth() {
        let request = Request::get("/").basic_auth("user", Some("pass"));
        assert_eq!(request.headers.get("authorization"), Some("Basic dXNlcjpwYXNz"));

        let request = Request::get("/").bearer_auth("token");
        assert_eq!(request.headers.get("Authorization"), Some("Bearer token"));
    }

    #[test]
    fn test_content_encoding_bytes() {
        assert_eq!(ContentEncoding::Utf8.encode("é"), vec![0xC3, 0xA9]);
        assert_eq!(ContentEncoding::Ascii.encode("aé"), b"a?".to_vec());
        assert_eq!(ContentEncoding::Utf16.encode("a"), vec![0x61, 0x00]);
        assert_eq!(ContentEncoding::Utf16BigEndian.encode("a"), vec![0x00, 0x61]);
        assert_eq!(ContentEncoding::Ascii.charset(), "us-ascii");
    }
}
