//! Turning a [`Request`] into a transport-ready request.
//!
//! Header merge and body selection are ordered guard checks; the first
//! matching rule wins.

use crate::request::{ContentEncoding, DEFAULT_CONTENT_TYPE, FORM_URL_ENCODED_CONTENT_TYPE};
use crate::serializer::HttpSerializer;
use crate::url_builder::build_url;
use crate::{Headers, HttpClientError, Request, Result, SerializationError};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

/// Client-level inputs to assembly, snapshotted at request start.
pub(crate) struct AssemblyContext<'a> {
    pub host: Option<&'a str>,
    pub default_headers: &'a Headers,
    pub user_agent: &'a str,
    pub serializer: &'a dyn HttpSerializer,
}

/// A request ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct AssembledRequest {
    /// HTTP method.
    pub method: Method,
    /// Resolved URL including query.
    pub url: Url,
    /// Headers to send, excluding the body content type.
    pub headers: HeaderMap,
    /// Body, if any.
    pub body: Option<AssembledBody>,
}

/// Encoded body with its content type.
#[derive(Debug, Clone)]
pub struct AssembledBody {
    /// `Content-Type` of the body.
    pub content_type: HeaderValue,
    /// Encoded bytes.
    pub bytes: Bytes,
}

impl AssembledBody {
    /// The body as UTF-8 text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Build the transport request.
///
/// May rewrite `request.content_type` (from a `Content-Type` header while
/// it still holds the default) and `request.string_body` (with the
/// serialized object body).
pub(crate) fn assemble(
    context: &AssemblyContext<'_>,
    request: &mut Request,
) -> Result<AssembledRequest> {
    let url = build_url(context.host, request)?;
    let headers = resolve_headers(request, context.default_headers, context.user_agent)?;

    let serializer_override = request.serializer_override.clone();
    let serializer: &dyn HttpSerializer = match serializer_override.as_deref() {
        Some(serializer) => serializer,
        None => context.serializer,
    };
    let body = resolve_body(request, serializer)?;

    Ok(AssembledRequest {
        method: request.method.clone(),
        url,
        headers,
        body,
    })
}

fn resolve_headers(
    request: &mut Request,
    defaults: &Headers,
    user_agent: &str,
) -> Result<HeaderMap> {
    let merged = request.headers.merged_with(defaults);
    let mut headers = HeaderMap::with_capacity(merged.len() + 1);

    if !merged.contains(USER_AGENT.as_str()) {
        headers.insert(USER_AGENT, header_value(USER_AGENT.as_str(), user_agent)?);
    }

    for (name, value) in merged.iter() {
        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            // A customized content_type field is never replaced.
            if request.content_type == DEFAULT_CONTENT_TYPE {
                request.content_type = value.to_string();
            }
            continue;
        }

        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpClientError::InvalidHeader {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        headers.append(header_name, header_value(name, value)?);
    }

    Ok(headers)
}

fn resolve_body(
    request: &mut Request,
    serializer: &dyn HttpSerializer,
) -> Result<Option<AssembledBody>> {
    if !request.form_url_encoded_parameters.is_empty() {
        let encoded = serde_urlencoded::to_string(&request.form_url_encoded_parameters)
            .map_err(|e| SerializationError::encode("form", e))?;
        return Ok(Some(AssembledBody {
            content_type: HeaderValue::from_static(FORM_URL_ENCODED_CONTENT_TYPE),
            bytes: Bytes::from(encoded),
        }));
    }

    if let Some(text) = request.string_body.as_deref().filter(|text| !text.is_empty()) {
        let body = text_body(text, &request.content_type, request.content_encoding)?;
        return Ok(Some(body));
    }

    if let Some(value) = request.body() {
        let serialized = serializer.serialize(value)?;
        let body = text_body(&serialized, &request.content_type, request.content_encoding)?;
        request.string_body = Some(serialized);
        return Ok(Some(body));
    }

    Ok(None)
}

fn text_body(text: &str, content_type: &str, encoding: ContentEncoding) -> Result<AssembledBody> {
    let content_type = if content_type.to_ascii_lowercase().contains("charset=") {
        content_type.to_string()
    } else {
        format!("{content_type}; charset={}", encoding.charset())
    };

    Ok(AssembledBody {
        content_type: header_value(CONTENT_TYPE.as_str(), &content_type)?,
        bytes: Bytes::from(encoding.encode(text)),
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| HttpClientError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{JsonSerializer, XmlSerializer};
    use serde::Serialize;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Payload {
        first_name: &'static str,
    }

    fn assemble_with(defaults: &Headers, request: &mut Request) -> AssembledRequest {
        let serializer = JsonSerializer::new();
        let context = AssemblyContext {
            host: Some("https://postman-echo.com"),
            default_headers: defaults,
            user_agent: "test-agent/1.0",
            serializer: &serializer,
        };
        assemble(&context, request).unwrap()
    }

    #[test]
    fn test_request_header_wins_case_insensitively() {
        let defaults: Headers = [("X-Test", "a")].into_iter().collect();
        let mut request = Request::get("/get").with_header("x-test", "b");

        let assembled = assemble_with(&defaults, &mut request);
        let values: Vec<_> = assembled.headers.get_all("x-test").iter().collect();

        assert_eq!(values, vec!["b"]);
    }

    #[test]
    fn test_default_headers_are_added() {
        let defaults: Headers = [("X-Default", "yes")].into_iter().collect();
        let mut request = Request::get("/get");

        let assembled = assemble_with(&defaults, &mut request);

        assert_eq!(assembled.headers["x-default"], "yes");
        assert_eq!(assembled.url.as_str(), "https://postman-echo.com/get");
        assert_eq!(assembled.method, Method::GET);
    }

    #[test]
    fn test_user_agent_default_and_override() {
        let mut request = Request::get("/get");
        let assembled = assemble_with(&Headers::new(), &mut request);
        assert_eq!(assembled.headers[USER_AGENT], "test-agent/1.0");

        let mut request = Request::get("/get").with_header("user-agent", "custom");
        let assembled = assemble_with(&Headers::new(), &mut request);
        let values: Vec<_> = assembled.headers.get_all(USER_AGENT).iter().collect();
        assert_eq!(values, vec!["custom"]);
    }

    #[test]
    fn test_content_type_header_sets_default_content_type() {
        let mut request = Request::post("/post")
            .with_header("Content-Type", "text/plain")
            .with_string_body("hello");

        let assembled = assemble_with(&Headers::new(), &mut request);

        assert!(assembled.headers.get(CONTENT_TYPE).is_none());
        assert_eq!(request.content_type, "text/plain");
        assert_eq!(
            assembled.body.unwrap().content_type,
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_content_type_header_does_not_replace_custom_content_type() {
        let mut request = Request::post("/post")
            .with_header("content-type", "text/plain")
            .with_content_type("application/xml")
            .with_string_body("<a/>");

        let assembled = assemble_with(&Headers::new(), &mut request);

        assert_eq!(request.content_type, "application/xml");
        assert_eq!(
            assembled.body.unwrap().content_type,
            "application/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_form_parameters_win_over_everything() {
        let mut request = Request::post("/post")
            .with_form("param1", "value1")
            .with_form("param2", "value 2")
            .with_string_body("ignored")
            .with_body(Payload { first_name: "ignored" })
            .with_content_type("text/plain");

        let assembled = assemble_with(&Headers::new(), &mut request);
        let body = assembled.body.unwrap();

        assert_eq!(body.as_text(), Some("param1=value1&param2=value+2"));
        assert_eq!(body.content_type, FORM_URL_ENCODED_CONTENT_TYPE);
    }

    #[test]
    fn test_string_body_wins_over_object_body() {
        let mut request = Request::post("/post")
            .with_body(Payload { first_name: "ignored" })
            .with_string_body("raw");

        let assembled = assemble_with(&Headers::new(), &mut request);

        assert_eq!(assembled.body.unwrap().as_text(), Some("raw"));
        assert_eq!(request.string_body.as_deref(), Some("raw"));
    }

    #[test]
    fn test_object_body_is_serialized_and_written_back() {
        let mut request = Request::post("/post").with_body(Payload { first_name: "Ada" });

        let assembled = assemble_with(&Headers::new(), &mut request);
        let body = assembled.body.unwrap();

        let expected = "{\n  \"firstName\": \"Ada\"\n}";
        assert_eq!(body.as_text(), Some(expected));
        assert_eq!(body.content_type, "application/json; charset=utf-8");
        assert_eq!(request.string_body.as_deref(), Some(expected));
    }

    #[test]
    fn test_serializer_override_is_used() {
        #[derive(Serialize)]
        struct Note {
            text: &'static str,
        }

        let mut request = Request::post("/post")
            .with_body(Note { text: "hi" })
            .with_content_type("application/xml")
            .with_serializer(Arc::new(XmlSerializer::new()));

        let assembled = assemble_with(&Headers::new(), &mut request);
        let text = assembled.body.unwrap().as_text().unwrap().to_string();

        assert!(text.contains("<Note>"));
        assert!(text.contains("<text>hi</text>"));
    }

    #[test]
    fn test_no_body() {
        let mut request = Request::get("/get");
        let assembled = assemble_with(&Headers::new(), &mut request);
        assert!(assembled.body.is_none());
    }

    #[test]
    fn test_content_encoding_is_applied() {
        let mut request = Request::post("/post")
            .with_string_body("a")
            .with_content_encoding(ContentEncoding::Utf16);

        let assembled = assemble_with(&Headers::new(), &mut request);
        let body = assembled.body.unwrap();

        assert_eq!(body.content_type, "application/json; charset=utf-16");
        assert_eq!(&body.bytes[..], &[0x61, 0x00]);
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let serializer = JsonSerializer::new();
        let defaults = Headers::new();
        let context = AssemblyContext {
            host: Some("http://localhost"),
            default_headers: &defaults,
            user_agent: "ua",
            serializer: &serializer,
        };
        let mut request = Request::get("/").with_header("bad header", "x");

        let result = assemble(&context, &mut request);
        assert!(matches!(result, Err(HttpClientError::InvalidHeader { .. })));
    }
}
