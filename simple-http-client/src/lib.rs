//! # Simple HTTP Client
//!
//! A thin request/response wrapper over a managed `reqwest` transport with
//! pluggable serialization and logging.
//!
//! ## Features
//!
//! - **Request descriptions**: path or full URL, query and form parameters,
//!   headers, raw or serialized bodies
//! - **Default headers**: merged case-insensitively; request headers win
//! - **Timeouts**: per-client and per-request, reported as a distinct error
//! - **Success codes**: treat selected non-2xx statuses as successful
//! - **Typed responses**: best-effort decoding that never hides status or body
//! - **Serializers**: indented camelCase JSON by default, XML available
//! - **Transport rotation**: the owned transport is rebuilt every few minutes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simple_http_client::{HttpClient, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::with_host("https://api.example.com");
//!
//!     let mut request = Request::get("/users").with_query("page", "2");
//!     let response = client.make_request(&mut request).await?;
//!
//!     println!("Status: {}", response.status_code);
//!     Ok(())
//! }
//! ```
//!
//! ## Typed Responses
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use simple_http_client::{HttpClient, HttpClientConfig, Request};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct NewOrder {
//!     item_name: String,
//!     quantity: u32,
//! }
//!
//! #[derive(Deserialize)]
//! struct Order {
//!     id: u64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .host("https://api.example.com")
//!         .timeout(Duration::from_secs(10))
//!         .default_header("X-Api-Key", "secret")
//!         .success_code(409)
//!         .build();
//!     let client = HttpClient::new(config);
//!
//!     let mut request = Request::post("/orders").with_body(NewOrder {
//!         item_name: "widget".to_string(),
//!         quantity: 5,
//!     });
//!     let response = client.make_typed_request::<Order>(&mut request).await?;
//!
//!     match (&response.body, &response.deserialization_error) {
//!         (Some(order), _) => println!("Created order {}", order.id),
//!         (None, Some(error)) => println!("Unexpected body ({error}): {}", response.text()),
//!         (None, None) => println!("Empty body, status {}", response.status_code),
//!     }
//!     Ok(())
//! }
//! ```

mod assemble;
mod client;
mod config;
mod error;
mod headers;
mod logging;
mod model;
mod request;
mod response;
mod serializer;
mod transport;
mod url_builder;

pub use assemble::{AssembledBody, AssembledRequest};
pub use client::HttpClient;
pub use config::{
    ClientOptions, DEFAULT_TIMEOUT, DEFAULT_TRANSPORT_ROTATION, DEFAULT_USER_AGENT,
    HttpClientConfig, HttpClientConfigBuilder, Timeout,
};
pub use error::{HttpClientError, Result, SerializationError};
pub use headers::Headers;
pub use logging::{HttpLogger, RequestHook, ResponseHook, TracingLogger};
pub use model::RestObject;
pub use request::{
    ContentEncoding, DEFAULT_CONTENT_TYPE, FORM_URL_ENCODED_CONTENT_TYPE, Request, RequestBody,
};
pub use response::{Response, TypedResponse, is_successful_status};
pub use serializer::{DecodeSink, FieldNaming, HttpSerializer, JsonSerializer, XmlSerializer};
pub use transport::{ReqwestTransportFactory, TransportFactory};
pub use url_builder::{build_url, combine_urls};

// Re-export common types
pub use bytes::Bytes;
pub use http::{Method, StatusCode};

/// Prelude for common imports.
///
/// ```
/// use simple_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{ClientOptions, HttpClientConfig, HttpClientConfigBuilder, Timeout};
    pub use crate::error::{HttpClientError, Result, SerializationError};
    pub use crate::logging::{HttpLogger, TracingLogger};
    pub use crate::model::RestObject;
    pub use crate::request::{ContentEncoding, Request};
    pub use crate::response::{Response, TypedResponse};
    pub use crate::serializer::{HttpSerializer, JsonSerializer, XmlSerializer};
    pub use crate::transport::{ReqwestTransportFactory, TransportFactory};
    pub use http::Method;
}
