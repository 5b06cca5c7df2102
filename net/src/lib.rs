//! Async request bridge for Ferry.
//!
//! The consumer starts requests under its own integer handles through
//! [`NetworkBridge`]. A [`Transport`] performs them on worker threads and reports
//! back through a callback; the [`RequestRegistry`] decides which callback wins, and
//! the winner is delivered to the consumer's [`EventSink`](ferry_types::EventSink).

mod bridge;
mod http;
mod registry;
mod transport;

pub use bridge::{BridgeError, NetworkBridge, outcome_for};
pub use http::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, HttpSettings, HttpToken, HttpTransport, build_client,
};
pub use registry::{Attach, CancelRequest, InFlightRequest, RegistryError, RequestRegistry, Ticket};
pub use transport::{CompletionCallback, HttpRequest, Transport, TransportResult, parse_headers};
