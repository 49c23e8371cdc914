//! HTTP Client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Errors that prevent a response from being obtained at all.
///
/// A non-2xx status is not an error; it is reported through
/// [`Response::is_successful`](crate::Response::is_successful).
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The send did not complete within the effective timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The combined URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// Header name as given by the caller.
        name: String,
        /// Reason the header was rejected.
        message: String,
    },

    /// The request body could not be serialized.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Client options could not be loaded.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// The client was used after [`HttpClient::dispose`](crate::HttpClient::dispose).
    #[error("HTTP client has been disposed")]
    Disposed,

    /// Underlying transport error (DNS, connection, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HttpClientError {
    /// Check if the request timeout elapsed.
    ///
    /// Transport failures, including connect timeouts, are not request
    /// timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// The timeout budget that elapsed, if this is a timeout.
    pub fn timeout_duration(&self) -> Option<Duration> {
        match self {
            Self::Timeout(duration) => Some(*duration),
            _ => None,
        }
    }

    /// Get the HTTP status code carried by a transport error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure to encode or decode a body with an [`HttpSerializer`](crate::HttpSerializer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// A value could not be rendered as text.
    #[error("{format} serialization failed: {message}")]
    Encode {
        /// Wire format name, e.g. `json`.
        format: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// Text could not be parsed into the requested type.
    #[error("{format} deserialization failed: {message}")]
    Decode {
        /// Wire format name, e.g. `json`.
        format: &'static str,
        /// Underlying error message.
        message: String,
    },
}

impl SerializationError {
    /// Build an encode error.
    pub fn encode(format: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    /// Build a decode error.
    pub fn decode(format: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            format,
            message: message.to_string(),
        }
    }

    /// Check if this error came from decoding.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error_is_distinct() {
        let err = HttpClientError::Timeout(Duration::from_secs(1));
        assert!(err.is_timeout());
        assert!(!err.is_connection());
        assert_eq!(err.timeout_duration(), Some(Duration::from_secs(1)));
        assert_eq!(err.to_string(), "Request timed out after 1s");
    }

    #[test]
    fn test_serialization_error_display() {
        let err = SerializationError::decode("json", "expected value at line 1 column 1");
        assert!(err.is_decode());
        assert_eq!(
            err.to_string(),
            "json deserialization failed: expected value at line 1 column 1"
        );

        let wrapped: HttpClientError = SerializationError::encode("xml", "no root").into();
        assert!(!wrapped.is_timeout());
        assert_eq!(wrapped.to_string(), "xml serialization failed: no root");
    }
}
