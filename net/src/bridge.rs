//! Consumer-facing request API: start, cancel, cancel-all.
//!
//! Every request ends in exactly one `RequestComplete` event unless the consumer
//! cancelled it with [`NetworkBridge::cancel`] or [`NetworkBridge::cancel_all`], in
//! which case it ends in none. Whichever terminal callback claims the registry entry
//! first wins; everything after is dropped.

use std::sync::Arc;

use thiserror::Error;

use ferry_types::{ConsumerEvent, EventSink, RequestHandle, RequestOutcome};

use crate::registry::{Attach, CancelRequest, RegistryError, RequestRegistry, Ticket};
use crate::transport::{HttpRequest, Transport, TransportResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("handle {} is reserved for cancel-all", RequestHandle::ALL.get())]
    ReservedHandle,
}

/// Map a transport result onto the consumer-visible outcome.
#[must_use]
pub fn outcome_for(result: TransportResult, url: &str) -> RequestOutcome {
    match result {
        TransportResult::Response { status, body } if (200..300).contains(&status) => {
            RequestOutcome::Success(body)
        }
        TransportResult::Response { status, .. } => RequestOutcome::unexpected_status(status, url),
        TransportResult::Failed(message) => RequestOutcome::Failure(message),
        TransportResult::Cancelled => RequestOutcome::Cancelled,
    }
}

struct Inner<T: Transport> {
    transport: T,
    registry: RequestRegistry<T::Token>,
    sink: Arc<dyn EventSink>,
}

impl<T: Transport> Inner<T> {
    fn complete(&self, handle: RequestHandle, ticket: Ticket, result: TransportResult) {
        let Some(entry) = self.registry.claim_ticket(handle, ticket) else {
            tracing::trace!(%handle, "Completion for resolved request dropped");
            return;
        };

        if entry.cancel_requested {
            tracing::trace!(%handle, "Completion for cancelled request dropped");
            return;
        }

        let outcome = outcome_for(result, &entry.url);
        match &outcome {
            RequestOutcome::Success(body) => {
                tracing::debug!(%handle, bytes = body.len(), "Request succeeded");
            }
            RequestOutcome::Failure(message) => {
                tracing::debug!(%handle, url = %entry.url, "Request failed: {message}");
            }
            RequestOutcome::Cancelled => tracing::debug!(%handle, "Request cancelled"),
        }
        self.sink
            .deliver(ConsumerEvent::RequestComplete { handle, outcome });
    }
}

/// Async request API keyed by consumer-chosen handles.
///
/// Cloning shares the same registry and transport.
pub struct NetworkBridge<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for NetworkBridge<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> NetworkBridge<T> {
    pub fn new(transport: T, sink: Arc<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                registry: RequestRegistry::new(),
                sink,
            }),
        }
    }

    /// Start `request` under `handle`.
    ///
    /// Reusing a handle that is still in flight is a caller bug and fails with
    /// [`RegistryError::DuplicateHandle`]; the original request is unaffected.
    pub fn start(&self, handle: RequestHandle, request: HttpRequest) -> Result<(), BridgeError> {
        if handle.is_all() {
            tracing::error!("Request started with the cancel-all handle");
            return Err(BridgeError::ReservedHandle);
        }

        let url = request.url.clone();
        let ticket = match self.inner.registry.reserve(handle, &url) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(%handle, url = %url, "{e}");
                return Err(e.into());
            }
        };
        tracing::debug!(%handle, method = request.method(), url = %url, "Starting request");

        let inner = Arc::clone(&self.inner);
        let token = self.inner.transport.start(
            request,
            Box::new(move |result| inner.complete(handle, ticket, result)),
        );

        match token {
            Some(token) => match self.inner.registry.attach(handle, ticket, token) {
                Attach::Attached => {}
                Attach::CancelRequested(token) => self.inner.transport.cancel(&token),
                Attach::Resolved(token) => {
                    // Either the transport already finished or cancel_all drained the
                    // reservation; cancelling a finished token is harmless.
                    self.inner.transport.cancel(&token);
                }
            },
            None => {
                if self.inner.registry.claim_ticket(handle, ticket).is_some() {
                    tracing::warn!(%handle, url = %url, "Transport refused request");
                    self.inner.sink.deliver(ConsumerEvent::RequestComplete {
                        handle,
                        outcome: RequestOutcome::Failure(format!(
                            "Failed to start request for URL: {url}"
                        )),
                    });
                }
            }
        }
        Ok(())
    }

    /// Ask the transport to cancel `handle`. The entry stays until the transport's
    /// terminal callback claims it; that callback emits nothing, so the consumer never
    /// hears about `handle` again. [`RequestHandle::ALL`] cancels everything.
    pub fn cancel(&self, handle: RequestHandle) {
        if handle.is_all() {
            self.cancel_all();
            return;
        }
        match self.inner.registry.request_cancel(handle) {
            CancelRequest::Forward(token) => {
                tracing::debug!(%handle, "Cancelling request");
                self.inner.transport.cancel(&token);
            }
            CancelRequest::Pending => {
                tracing::debug!(%handle, "Cancel requested before transport token attached");
            }
            CancelRequest::Unknown => {
                tracing::trace!(%handle, "Cancel for unknown handle ignored");
            }
        }
    }

    /// Clear every outstanding request. Cleared handles receive no further events.
    pub fn cancel_all(&self) {
        let drained = self.inner.registry.drain();
        if drained.is_empty() {
            return;
        }
        tracing::info!(count = drained.len(), "Cancelling all requests");
        for entry in drained {
            if let Some(token) = entry.token {
                self.inner.transport.cancel(&token);
            }
        }
    }

    /// Clear the registry and tell the transport to abandon everything, including
    /// requests it may still be starting.
    pub fn shutdown(&self) {
        self.cancel_all();
        self.inner.transport.cancel_all();
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.registry.len()
    }

    #[must_use]
    pub fn is_in_flight(&self, handle: RequestHandle) -> bool {
        self.inner.registry.contains(handle)
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let url = "http://tiles/0/0/0";
        assert_eq!(
            outcome_for(
                TransportResult::Response {
                    status: 200,
                    body: b"x".to_vec()
                },
                url
            ),
            RequestOutcome::Success(b"x".to_vec())
        );
        assert!(
            outcome_for(
                TransportResult::Response {
                    status: 299,
                    body: Vec::new()
                },
                url
            )
            .is_success()
        );
        assert_eq!(
            outcome_for(
                TransportResult::Response {
                    status: 300,
                    body: Vec::new()
                },
                url
            ),
            RequestOutcome::unexpected_status(300, url)
        );
        assert_eq!(
            outcome_for(
                TransportResult::Response {
                    status: 199,
                    body: Vec::new()
                },
                url
            ),
            RequestOutcome::unexpected_status(199, url)
        );
    }

    #[test]
    fn test_transport_failure_and_cancel() {
        assert_eq!(
            outcome_for(TransportResult::Failed("timeout".into()), "u"),
            RequestOutcome::Failure("timeout".into())
        );
        assert_eq!(
            outcome_for(TransportResult::Cancelled, "u"),
            RequestOutcome::Cancelled
        );
    }
}
