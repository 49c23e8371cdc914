//! HTTP client configuration.

use crate::headers::Headers;
use crate::logging::{HttpLogger, RequestHook, ResponseHook};
use crate::serializer::{HttpSerializer, JsonSerializer};
use crate::transport::{ReqwestTransportFactory, TransportFactory};
use crate::{HttpClientError, Request, Response, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default User-Agent sent when no request or default header sets one.
pub const DEFAULT_USER_AGENT: &str = concat!("simple-http-client/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between self-owned transport replacements.
pub const DEFAULT_TRANSPORT_ROTATION: Duration = Duration::from_secs(5 * 60);

/// Time budget for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Fail with [`HttpClientError::Timeout`] once this much time has passed.
    After(Duration),
    /// Wait indefinitely.
    Disabled,
}

impl Timeout {
    /// Build from whole seconds; any negative value (conventionally `-1`)
    /// disables the timeout.
    pub fn from_secs(secs: i64) -> Self {
        u64::try_from(secs)
            .map(|secs| Self::After(Duration::from_secs(secs)))
            .unwrap_or(Self::Disabled)
    }

    /// The budget, or `None` when disabled.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::After(duration) => Some(*duration),
            Self::Disabled => None,
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::After(DEFAULT_TIMEOUT)
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self::After(duration)
    }
}

/// HTTP client configuration.
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Base URL joined with each request path. When unset, request paths
    /// must be full URLs.
    pub host: Option<String>,
    /// Default request timeout.
    pub timeout: Timeout,
    /// Headers sent with every request unless the request sets them.
    pub default_headers: Headers,
    /// Statuses treated as successful for every request.
    pub additional_successful_status_codes: BTreeSet<u16>,
    /// Body serializer.
    pub serializer: Arc<dyn HttpSerializer>,
    /// Request/response logger.
    pub logger: Option<Arc<dyn HttpLogger>>,
    /// Called with each request right before it is sent.
    pub on_request: Option<RequestHook>,
    /// Called with each response right after it is received.
    pub on_response: Option<ResponseHook>,
    /// Externally managed transport source.
    pub transport_factory: Option<Arc<dyn TransportFactory>>,
    /// Settings for the self-owned transport; unused with a `transport_factory`.
    pub transport_settings: ReqwestTransportFactory,
    /// User agent string.
    pub user_agent: String,
    /// How often the self-owned transport is replaced.
    pub transport_rotation_interval: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            host: None,
            timeout: Timeout::default(),
            default_headers: Headers::new(),
            additional_successful_status_codes: BTreeSet::new(),
            serializer: Arc::new(JsonSerializer::new()),
            logger: None,
            on_request: None,
            on_response: None,
            transport_factory: None,
            transport_settings: ReqwestTransportFactory::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            transport_rotation_interval: DEFAULT_TRANSPORT_ROTATION,
        }
    }
}

impl HttpClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers)
            .field(
                "additional_successful_status_codes",
                &self.additional_successful_status_codes,
            )
            .field("serializer", &self.serializer)
            .field("logger", &self.logger.is_some())
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("transport_factory", &self.transport_factory.is_some())
            .field("transport_settings", &self.transport_settings)
            .field("user_agent", &self.user_agent)
            .field("transport_rotation_interval", &self.transport_rotation_interval)
            .finish()
    }
}

/// Builder for HTTP client configuration.
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL for all requests.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.config.timeout = timeout.into();
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name, value);
        self
    }

    /// Treat an extra status code as successful for all requests.
    pub fn success_code(mut self, status: u16) -> Self {
        self.config.additional_successful_status_codes.insert(status);
        self
    }

    /// Set the body serializer.
    pub fn serializer(mut self, serializer: impl HttpSerializer + 'static) -> Self {
        self.config.serializer = Arc::new(serializer);
        self
    }

    /// Set the logger.
    pub fn logger(mut self, logger: impl HttpLogger + 'static) -> Self {
        self.config.logger = Some(Arc::new(logger));
        self
    }

    /// Set a callback invoked with each outgoing request and its URL.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Request) + Send + Sync + 'static,
    {
        self.config.on_request = Some(Arc::new(hook));
        self
    }

    /// Set a callback invoked with each received response.
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.config.on_response = Some(Arc::new(hook));
        self
    }

    /// Use an externally managed transport source.
    pub fn transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.config.transport_factory = Some(Arc::new(factory));
        self
    }

    /// Tune the self-owned transport (redirects, pooling, connect timeout).
    ///
    /// The settings are used for the first build and for every rotation.
    pub fn transport_settings(mut self, settings: ReqwestTransportFactory) -> Self {
        self.config.transport_settings = settings;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set how often the self-owned transport is replaced.
    pub fn transport_rotation_interval(mut self, interval: Duration) -> Self {
        self.config.transport_rotation_interval = interval;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Plain client options that can be loaded from JSON or the environment.
///
/// Anything that is not data (serializer, logger, transport factory) is set
/// on the builder returned by [`ClientOptions::into_builder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Base URL.
    pub host: Option<String>,
    /// Timeout in seconds; `-1` disables it.
    pub timeout_secs: Option<i64>,
    /// Default headers.
    pub default_headers: BTreeMap<String, String>,
    /// Extra successful status codes.
    pub additional_successful_status_codes: Vec<u16>,
    /// User agent override.
    pub user_agent: Option<String>,
    /// Transport rotation interval in seconds.
    pub transport_rotation_secs: Option<u64>,
}

impl ClientOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HttpClientError::Config(e.to_string()))
    }

    /// Load options from `PREFIX_*` environment variables.
    ///
    /// See [`ClientOptions::from_vars`] for the recognized names.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Load options from `PREFIX_*` variables.
    ///
    /// Recognized: `HOST`, `TIMEOUT`, `USER_AGENT`, `SUCCESS_CODES`
    /// (comma separated), `TRANSPORT_ROTATION_SECS`, and `HEADER_<NAME>`
    /// where underscores in `<NAME>` become dashes.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = Self::default();
        let prefix = format!("{}_", prefix.trim_end_matches('_'));

        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(&prefix) else {
                continue;
            };
            let value = value.into();
            match name {
                "HOST" => options.host = Some(value),
                "TIMEOUT" => options.timeout_secs = Some(parse_var(name, &value)?),
                "USER_AGENT" => options.user_agent = Some(value),
                "TRANSPORT_ROTATION_SECS" => {
                    options.transport_rotation_secs = Some(parse_var(name, &value)?)
                }
                "SUCCESS_CODES" => {
                    for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                        options
                            .additional_successful_status_codes
                            .push(parse_var(name, code)?);
                    }
                }
                other => {
                    if let Some(header) = other.strip_prefix("HEADER_") {
                        options
                            .default_headers
                            .insert(header.replace('_', "-"), value);
                    }
                }
            }
        }

        Ok(options)
    }

    /// Turn the options into a configuration builder.
    pub fn into_builder(self) -> HttpClientConfigBuilder {
        let mut builder = HttpClientConfig::builder();
        if let Some(host) = self.host {
            builder = builder.host(host);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Timeout::from_secs(secs));
        }
        for (name, value) in self.default_headers {
            builder = builder.default_header(name, value);
        }
        for status in self.additional_successful_status_codes {
            builder = builder.success_code(status);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(secs) = self.transport_rotation_secs {
            builder = builder.transport_rotation_interval(Duration::from_secs(secs));
        }
        builder
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| HttpClientError::Config(format!("{name}={value}: {e}")))
}
