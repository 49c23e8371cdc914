//! Request and response logging.

use crate::model::RestObject;
use crate::{Request, Response};
use std::sync::Arc;

/// Callback invoked with the URL and request right before sending.
pub type RequestHook = Arc<dyn Fn(&str, &Request) + Send + Sync>;

/// Callback invoked with the response right after it is received.
pub type ResponseHook = Arc<dyn Fn(&Response) + Send + Sync>;

/// Observes requests before they are sent and responses after they arrive.
///
/// Calls are made inline on the request path and are not guarded: a panic
/// in a logger propagates to the caller of `make_request`.
pub trait HttpLogger: Send + Sync {
    /// Called with the resolved URL before the request is sent.
    fn log_request(&self, url: &str, request: &Request);

    /// Called with the populated response.
    fn log_response(&self, response: &Response);
}

/// Logger that writes requests and responses to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    log_headers: bool,
    log_body: bool,
}

impl TracingLogger {
    /// Create a new tracing logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }

    /// Enable logging of body.
    pub fn with_body(mut self) -> Self {
        self.log_body = true;
        self
    }

    fn log_details(&self, side: &'static str, object: &dyn RestObject) {
        if self.log_headers {
            for (name, value) in object.headers() {
                tracing::trace!(
                    id = %object.id(),
                    side,
                    header = %name,
                    value = %value,
                    "HTTP header"
                );
            }
        }

        if self.log_body
            && let Some(body) = object.string_body()
        {
            tracing::trace!(id = %object.id(), side, body = %body, "HTTP body");
        }
    }
}

impl HttpLogger for TracingLogger {
    fn log_request(&self, url: &str, request: &Request) {
        tracing::debug!(
            id = %request.id(),
            method = %request.method,
            url = %url,
            "Sending HTTP request"
        );
        self.log_details("request", request);
    }

    fn log_response(&self, response: &Response) {
        tracing::debug!(
            id = %response.id(),
            status = response.status_code,
            successful = response.is_successful,
            "Received HTTP response"
        );
        self.log_details("response", response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_accepts_request_and_response() {
        let logger = TracingLogger::new().with_headers().with_body();
        let request = Request::post("/post")
            .with_header("X-Test", "a")
            .with_string_body("{}");
        let response = Response::new(request.id());

        logger.log_request("http://localhost/post", &request);
        logger.log_response(&response);

        assert!(logger.log_headers);
        assert!(logger.log_body);
    }
}
