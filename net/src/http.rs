//! Production transport: reqwest on a tokio runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use tokio::runtime::Handle;

use crate::transport::{CompletionCallback, HttpRequest, Transport, TransportResult};

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
pub const DEFAULT_USER_AGENT: &str = concat!("ferry/", env!("CARGO_PKG_VERSION"));

/// TCP keepalive for pooled connections.
const TCP_KEEPALIVE_SECS: u64 = 60;
/// How long idle pooled connections are kept.
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Client settings resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Whole-request timeout. Expiry surfaces as an ordinary failure.
    pub request_timeout: Duration,
    pub user_agent: String,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }
}

/// Build the shared client. Tile servers are commonly plain HTTP, so HTTPS is not
/// enforced.
pub fn build_client(settings: &HttpSettings) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.clone())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .build()
}

/// Cancellation token for one HTTP request.
#[derive(Debug, Clone)]
pub struct HttpToken {
    id: u64,
    abort: AbortHandle,
}

impl HttpToken {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// [`Transport`] that runs each request as a task on a tokio runtime.
///
/// Cancellation aborts the task; the callback then reports
/// [`TransportResult::Cancelled`].
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Handle,
    live: Arc<Mutex<HashMap<u64, AbortHandle>>>,
    next_id: AtomicU64,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: reqwest::Client, runtime: Handle) -> Self {
        Self {
            client,
            runtime,
            live: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_settings(settings: &HttpSettings, runtime: Handle) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_client(settings)?, runtime))
    }

    /// Number of requests whose tasks have not finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Transport for HttpTransport {
    type Token = HttpToken;

    fn start(&self, request: HttpRequest, on_complete: CompletionCallback) -> Option<HttpToken> {
        if let Err(e) = reqwest::Url::parse(&request.url) {
            tracing::warn!(url = %request.url, "Refusing request with invalid URL: {e}");
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (abort, registration) = AbortHandle::new_pair();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, abort.clone());

        let client = self.client.clone();
        let live = Arc::clone(&self.live);
        self.runtime.spawn(async move {
            let result = match Abortable::new(execute(&client, request), registration).await {
                Ok(result) => result,
                Err(_aborted) => TransportResult::Cancelled,
            };
            live.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            on_complete(result);
        });

        Some(HttpToken { id, abort })
    }

    fn cancel(&self, token: &HttpToken) {
        token.abort.abort();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token.id);
    }

    fn cancel_all(&self) {
        let drained: Vec<AbortHandle> = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, abort)| abort)
            .collect();
        for abort in drained {
            abort.abort();
        }
    }
}

async fn execute(client: &reqwest::Client, request: HttpRequest) -> TransportResult {
    let HttpRequest {
        url,
        headers,
        payload,
    } = request;

    let mut builder = match payload {
        Some(body) => client.post(&url).body(body),
        None => client.get(&url),
    };
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url = %url, "Request failed: {e}");
            return TransportResult::Failed(e.to_string());
        }
    };

    let status = response.status().as_u16();
    if !response.status().is_success() {
        return TransportResult::Response {
            status,
            body: Vec::new(),
        };
    }

    match response.bytes().await {
        Ok(body) => TransportResult::Response {
            status,
            body: body.to_vec(),
        },
        Err(e) => TransportResult::Failed(e.to_string()),
    }
}
