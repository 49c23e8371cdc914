//! Transport ownership and rotation.
//!
//! The client either borrows transports from a caller-supplied
//! [`TransportFactory`] (one `create` call per request, lifecycle owned by
//! the caller) or owns a single `reqwest::Client` that it replaces on a
//! fixed interval so pooled connections pick up DNS changes.
//!
//! `reqwest::Client` is a reference-counted handle: replacing the owned
//! transport never interrupts requests already holding the previous one.

use crate::{HttpClientError, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Source of transports managed outside the client.
pub trait TransportFactory: Send + Sync {
    /// Produce the transport for one request.
    fn create(&self) -> Result<reqwest::Client>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Result<reqwest::Client> + Send + Sync,
{
    fn create(&self) -> Result<reqwest::Client> {
        self()
    }
}

/// Builds the transports a client owns.
///
/// Pass one to [`crate::HttpClientConfigBuilder::transport_settings`] to
/// tune the owned transport; every rotation rebuilds it from the same
/// settings.
/// Cookies are never stored, redirects are followed and compressed
/// responses are decoded. Request timeouts are enforced by the client, so
/// the transport itself has none. A connect timeout failure is reported as
/// [`HttpClientError::Http`], not as a request timeout.

#[derive(Debug, Clone)]
pub struct ReqwestTransportFactory {
    max_redirects: usize,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    connect_timeout: Option<Duration>,
}

impl Default for ReqwestTransportFactory {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            connect_timeout: None,
        }
    }
}

impl ReqwestTransportFactory {
    /// Create a factory with default transport settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set max idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set a connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

/// The transport slot shared with the rotation timer.
#[derive(Default)]
struct OwnedTransport {
    slot: RwLock<Option<reqwest::Client>>,
    generation: AtomicU64,
}

impl OwnedTransport {
    fn replace(&self, client: reqwest::Client) -> u64 {
        *self.slot.write() = Some(client);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Hands out transports for requests.
pub(crate) struct TransportManager {
    factory: Option<Arc<dyn TransportFactory>>,
    builder: ReqwestTransportFactory,
    owned: Arc<OwnedTransport>,
    rotation_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl TransportManager {
    /// Manage transports; with no `factory` the manager owns one built from
    /// `settings` and rebuilds it every `rotation_interval` (zero disables
    /// rotation).
    pub(crate) fn new(
        factory: Option<Arc<dyn TransportFactory>>,
        settings: ReqwestTransportFactory,
        rotation_interval: Duration,
    ) -> Self {
        Self {
            factory,
            builder: settings,
            owned: Arc::new(OwnedTransport::default()),
            rotation_interval,
            timer: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// The transport to use for the next request.
    pub(crate) fn get(&self) -> Result<reqwest::Client> {
        if self.is_disposed() {
            return Err(HttpClientError::Disposed);
        }

        if let Some(factory) = &self.factory {
            return factory.create();
        }

        if let Some(client) = self.owned.slot.read().as_ref() {
            return Ok(client.clone());
        }

        let client = {
            let mut slot = self.owned.slot.write();
            match slot.as_ref() {
                Some(client) => client.clone(),
                None => {
                    let client = self.builder.create()?;
                    *slot = Some(client.clone());
                    let generation = self.owned.generation.fetch_add(1, Ordering::AcqRel) + 1;
                    debug!(generation, "Built HTTP transport");
                    client
                }
            }
        };

        self.ensure_timer();
        Ok(client)
    }

    /// How many owned transports have been built so far.
    pub(crate) fn generation(&self) -> u64 {
        self.owned.generation.load(Ordering::Acquire)
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stop rotation and release the owned transport. Idempotent.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
        self.owned.slot.write().take();
        debug!("HTTP transport disposed");
    }

    fn ensure_timer(&self) {
        if self.rotation_interval.is_zero() {
            return;
        }

        let mut timer = self.timer.lock();
        if timer.is_some() || self.is_disposed() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No Tokio runtime available; HTTP transport will not be rotated");
            return;
        };

        let owned = Arc::downgrade(&self.owned);
        let builder = self.builder.clone();
        let period = self.rotation_interval;
        *timer = Some(runtime.spawn(rotate_periodically(owned, builder, period)));
    }
}

impl Drop for TransportManager {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for TransportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportManager")
            .field("external", &self.factory.is_some())
            .field("generation", &self.generation())
            .field("rotation_interval", &self.rotation_interval)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

async fn rotate_periodically(
    owned: Weak<OwnedTransport>,
    builder: ReqwestTransportFactory,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(owned) = owned.upgrade() else {
            break;
        };

        match builder.create() {
            Ok(client) => {
                let generation = owned.replace(client);
                debug!(generation, "Rotated HTTP transport");
            }
            Err(error) => {
                warn!(error = %error, "Failed to rebuild HTTP transport; keeping the current one");
            }
        }
    }
}
