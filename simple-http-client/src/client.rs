//! HTTP client implementation.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::assemble::{AssembledRequest, AssemblyContext, assemble};
use crate::logging::HttpLogger;
use crate::model::RestObject;
use crate::response::{decode_body, populate, set_body};
use crate::serializer::HttpSerializer;
use crate::transport::TransportManager;
use crate::url_builder::build_url;
use crate::{HttpClientConfig, HttpClientError, Request, Response, Result, Timeout, TypedResponse};

/// HTTP client wrapping a managed transport.
///
/// Cloning is cheap; clones share configuration and transport. The
/// configuration can be changed while requests are in flight: each request
/// reads it once when it starts, and the last write wins.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    settings: RwLock<HttpClientConfig>,
    transport: TransportManager,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Self {
        let transport = TransportManager::new(
            config.transport_factory.clone(),
            config.transport_settings.clone(),
            config.transport_rotation_interval,
        );

        Self {
            inner: Arc::new(ClientInner {
                settings: RwLock::new(config),
                transport,
            }),
        }
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Self {
        Self::new(HttpClientConfig::default())
    }

    /// Create a client whose request paths are relative to `host`.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self::new(HttpClientConfig::builder().host(host).build())
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> HttpClientConfig {
        self.inner.settings.read().clone()
    }

    /// Set the base URL.
    pub fn set_host(&self, host: impl Into<String>) {
        self.inner.settings.write().host = Some(host.into());
    }

    /// Set the default timeout.
    pub fn set_timeout(&self, timeout: impl Into<Timeout>) {
        self.inner.settings.write().timeout = timeout.into();
    }

    /// Add or replace a default header.
    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.settings.write().default_headers.insert(name, value);
    }

    /// Remove a default header, returning its value.
    pub fn remove_default_header(&self, name: &str) -> Option<String> {
        self.inner.settings.write().default_headers.remove(name)
    }

    /// Treat an extra status code as successful for all requests.
    pub fn add_successful_status_code(&self, status: u16) {
        self.inner
            .settings
            .write()
            .additional_successful_status_codes
            .insert(status);
    }

    /// Replace the body serializer.
    pub fn set_serializer(&self, serializer: impl HttpSerializer + 'static) {
        self.inner.settings.write().serializer = Arc::new(serializer);
    }

    /// Replace the logger.
    pub fn set_logger(&self, logger: impl HttpLogger + 'static) {
        self.inner.settings.write().logger = Some(Arc::new(logger));
    }

    /// The URL `request` would be sent to.
    pub fn url_for(&self, request: &Request) -> Result<String> {
        let host = self.inner.settings.read().host.clone();
        Ok(build_url(host.as_deref(), request)?.into())
    }

    /// Send a request and return the response.
    ///
    /// A non-2xx status is a normal result; check
    /// [`Response::is_successful`]. The request is updated to reflect what
    /// was sent (see [`Request`]).
    pub async fn make_request(&self, request: &mut Request) -> Result<Response> {
        let settings = self.config();
        self.execute(&settings, request).await
    }

    /// Send a request and decode the response body into `T`.
    ///
    /// Decode failures do not fail the call; they are reported in
    /// [`TypedResponse::deserialization_error`].
    pub async fn make_typed_request<T: DeserializeOwned>(
        &self,
        request: &mut Request,
    ) -> Result<TypedResponse<T>> {
        let settings = self.config();
        let response = self.execute(&settings, request).await?;

        let serializer = request
            .serializer_override
            .clone()
            .unwrap_or_else(|| settings.serializer.clone());
        Ok(decode_body(response, serializer.as_ref()))
    }

    /// Stop transport rotation and release the owned transport.
    ///
    /// Safe to call more than once. Requests made afterwards fail with
    /// [`HttpClientError::Disposed`].
    pub fn dispose(&self) {
        self.inner.transport.dispose();
    }

    /// Check whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.transport.is_disposed()
    }

    /// Number of self-owned transports built so far.
    pub fn transport_generation(&self) -> u64 {
        self.inner.transport.generation()
    }

    async fn execute(
        &self,
        settings: &HttpClientConfig,
        request: &mut Request,
    ) -> Result<Response> {
        if self.is_disposed() {
            return Err(HttpClientError::Disposed);
        }

        let context = AssemblyContext {
            host: settings.host.as_deref(),
            default_headers: &settings.default_headers,
            user_agent: &settings.user_agent,
            serializer: settings.serializer.as_ref(),
        };
        let assembled = assemble(&context, request)?;
        let url = assembled.url.to_string();

        if let Some(logger) = &settings.logger {
            logger.log_request(&url, request);
        }
        if let Some(hook) = &settings.on_request {
            hook(&url, request);
        }

        let transport = self.inner.transport.get()?;
        let timeout = request.timeout_override.unwrap_or(settings.timeout);
        debug!(
            id = %request.id(),
            method = %request.method,
            url = %url,
            ?timeout,
            "Dispatching request"
        );

        let exchange = send(transport, assembled);
        let (status, headers, body) = match timeout.duration() {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| timed_out(&*request, &url, limit))??,
            None => exchange.await?,
        };

        let mut response = Response::new(request.id());
        populate(
            &mut response,
            status,
            &headers,
            &settings.additional_successful_status_codes,
            &request.additional_successful_status_codes,
        );
        set_body(&mut response, body);

        if let Some(logger) = &settings.logger {
            logger.log_response(&response);
        }
        if let Some(hook) = &settings.on_response {
            hook(&response);
        }

        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::default_client()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &*self.inner.settings.read())
            .field("transport", &self.inner.transport)
            .finish()
    }
}

fn timed_out(request: &Request, url: &str, limit: Duration) -> HttpClientError {
    warn!(id = %request.id(), url = %url, timeout = ?limit, "Request timed out");
    HttpClientError::Timeout(limit)
}

/// Send the request and read the whole body.
async fn send(
    transport: reqwest::Client,
    request: AssembledRequest,
) -> Result<(StatusCode, HeaderMap, Bytes)> {
    let mut builder = transport
        .request(request.method, request.url)
        .headers(request.headers);

    if let Some(body) = request.body {
        builder = builder.header(CONTENT_TYPE, body.content_type).body(body.bytes);
    }

    let response = builder.send().await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    Ok((status, headers, body))
}
