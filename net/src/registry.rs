//! Lock-guarded map of in-flight requests.
//!
//! The registry is the only state in the bridge touched concurrently by many
//! threads. Every operation takes the lock once, so `claim` is the single point that
//! decides which terminal callback wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use ferry_types::RequestHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("request handle {0} is already in flight")]
    DuplicateHandle(RequestHandle),
}

/// Identifies one reservation of a handle.
///
/// A handle can be reused once its request is claimed, so callbacks carry the ticket
/// of the reservation they belong to and never resolve a later request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A live registry entry.
#[derive(Debug, Clone)]
pub struct InFlightRequest<T> {
    pub handle: RequestHandle,
    pub url: String,
    /// `None` between `reserve` and `attach`.
    pub token: Option<T>,
    pub cancel_requested: bool,
    ticket: Ticket,
}

impl<T> InFlightRequest<T> {
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }
}

/// Result of attaching a transport token to a reservation.
#[derive(Debug, PartialEq, Eq)]
pub enum Attach<T> {
    /// Entry is live and now holds the token.
    Attached,
    /// `cancel` ran while the token was pending. The token is stored and must be
    /// cancelled by the caller.
    CancelRequested(T),
    /// Entry was already claimed or drained. The token is orphaned.
    Resolved(T),
}

/// Result of a cancellation request for one handle.
#[derive(Debug, PartialEq, Eq)]
pub enum CancelRequest<T> {
    /// Forward cancellation to this token.
    Forward(T),
    /// Marked; the token is not attached yet and will be cancelled on attach.
    Pending,
    /// No live entry for the handle.
    Unknown,
}

#[derive(Debug)]
struct State<T> {
    entries: HashMap<RequestHandle, InFlightRequest<T>>,
    next_ticket: u64,
}

impl<T> State<T> {
    fn insert(
        &mut self,
        handle: RequestHandle,
        url: &str,
        token: Option<T>,
    ) -> Result<Ticket, RegistryError> {
        if self.entries.contains_key(&handle) {
            return Err(RegistryError::DuplicateHandle(handle));
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.entries.insert(
            handle,
            InFlightRequest {
                handle,
                url: url.to_string(),
                token,
                cancel_requested: false,
                ticket,
            },
        );
        Ok(ticket)
    }
}

/// Owned registry of in-flight requests keyed by consumer handle.
#[derive(Debug)]
pub struct RequestRegistry<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for RequestRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                next_ticket: 0,
            }),
        }
    }

    // Every method leaves the map consistent before it can panic, so a poisoned
    // lock still guards valid state.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `handle` before the transport is started.
    pub fn reserve(&self, handle: RequestHandle, url: &str) -> Result<Ticket, RegistryError> {
        self.lock().insert(handle, url, None)
    }

    /// Reserve and attach in one step.
    pub fn register(
        &self,
        handle: RequestHandle,
        url: &str,
        token: T,
    ) -> Result<Ticket, RegistryError> {
        self.lock().insert(handle, url, Some(token))
    }

    /// Store the transport token for a reservation.
    pub fn attach(&self, handle: RequestHandle, ticket: Ticket, token: T) -> Attach<T>
    where
        T: Clone,
    {
        let mut state = self.lock();
        match state.entries.get_mut(&handle) {
            Some(entry) if entry.ticket == ticket => {
                if entry.cancel_requested {
                    entry.token = Some(token.clone());
                    Attach::CancelRequested(token)
                } else {
                    entry.token = Some(token);
                    Attach::Attached
                }
            }
            _ => Attach::Resolved(token),
        }
    }

    /// Remove and return the entry for `handle`.
    ///
    /// `None` means the request was already claimed or drained; the caller drops
    /// whatever result it was holding.
    pub fn claim(&self, handle: RequestHandle) -> Option<InFlightRequest<T>> {
        self.lock().entries.remove(&handle)
    }

    /// Like [`RequestRegistry::claim`], but only if the live entry is `ticket`'s.
    pub fn claim_ticket(&self, handle: RequestHandle, ticket: Ticket) -> Option<InFlightRequest<T>> {
        let mut state = self.lock();
        match state.entries.get(&handle) {
            Some(entry) if entry.ticket == ticket => state.entries.remove(&handle),
            _ => None,
        }
    }

    /// Mark `handle` cancel-requested. The entry stays live until its callback
    /// claims it.
    pub fn request_cancel(&self, handle: RequestHandle) -> CancelRequest<T>
    where
        T: Clone,
    {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(&handle) else {
            return CancelRequest::Unknown;
        };
        entry.cancel_requested = true;
        match &entry.token {
            Some(token) => CancelRequest::Forward(token.clone()),
            None => CancelRequest::Pending,
        }
    }

    /// Remove every entry at once.
    pub fn drain(&self) -> Vec<InFlightRequest<T>> {
        self.lock().entries.drain().map(|(_, entry)| entry).collect()
    }

    #[must_use]
    pub fn contains(&self, handle: RequestHandle) -> bool {
        self.lock().entries.contains_key(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn h(raw: i64) -> RequestHandle {
        RequestHandle::new(raw)
    }

    #[test]
    fn test_register_then_claim_once() {
        let registry = RequestRegistry::new();
        registry.register(h(1), "http://a", 10u64).unwrap();

        let entry = registry.claim(h(1)).unwrap();
        assert_eq!(entry.token, Some(10));
        assert_eq!(entry.url, "http://a");
        assert!(registry.claim(h(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let registry = RequestRegistry::new();
        registry.register(h(7), "http://a", 1u64).unwrap();
        assert_eq!(
            registry.register(h(7), "http://b", 2u64),
            Err(RegistryError::DuplicateHandle(h(7)))
        );
        assert_eq!(
            registry.reserve(h(7), "http://b"),
            Err(RegistryError::DuplicateHandle(h(7)))
        );
        assert_eq!(registry.claim(h(7)).unwrap().url, "http://a");
    }

    #[test]
    fn test_handle_reusable_after_claim() {
        let registry = RequestRegistry::new();
        registry.register(h(3), "http://a", 1u64).unwrap();
        registry.claim(h(3));
        assert!(registry.register(h(3), "http://b", 2u64).is_ok());
    }

    #[test]
    fn test_attach_after_reserve() {
        let registry = RequestRegistry::new();
        let ticket = registry.reserve(h(1), "http://a").unwrap();
        assert_eq!(registry.attach(h(1), ticket, 5u64), Attach::Attached);
        assert_eq!(registry.claim(h(1)).unwrap().token, Some(5));
    }

    #[test]
    fn test_attach_after_claim_is_resolved() {
        let registry = RequestRegistry::new();
        let ticket = registry.reserve(h(1), "http://a").unwrap();
        registry.claim(h(1));
        assert_eq!(registry.attach(h(1), ticket, 5u64), Attach::Resolved(5));
    }

    #[test]
    fn test_attach_to_stale_ticket_is_resolved() {
        let registry = RequestRegistry::new();
        let old = registry.reserve(h(1), "http://a").unwrap();
        registry.claim(h(1));
        let new = registry.reserve(h(1), "http://b").unwrap();
        assert_ne!(old, new);
        assert_eq!(registry.attach(h(1), old, 5u64), Attach::Resolved(5));
        assert!(registry.claim_ticket(h(1), old).is_none());
        assert_eq!(registry.claim_ticket(h(1), new).unwrap().url, "http://b");
    }

    #[test]
    fn test_cancel_before_attach_is_pending() {
        let registry = RequestRegistry::new();
        let ticket = registry.reserve(h(9), "http://a").unwrap();
        assert_eq!(registry.request_cancel(h(9)), CancelRequest::Pending);
        assert_eq!(
            registry.attach(h(9), ticket, 4u64),
            Attach::CancelRequested(4)
        );
        let entry = registry.claim(h(9)).unwrap();
        assert!(entry.cancel_requested);
    }

    #[test]
    fn test_cancel_keeps_entry_live() {
        let registry = RequestRegistry::new();
        registry.register(h(42), "http://a", 42u64).unwrap();
        assert_eq!(registry.request_cancel(h(42)), CancelRequest::Forward(42));
        assert!(registry.contains(h(42)));
        assert_eq!(
            registry.request_cancel(h(43)),
            CancelRequest::<u64>::Unknown
        );
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = RequestRegistry::new();
        for i in 0..4 {
            registry.register(h(i), "http://a", i as u64).unwrap();
        }
        let drained = registry.drain();
        assert_eq!(drained.len(), 4);
        assert!(registry.is_empty());
        assert!((0..4).all(|i| registry.claim(h(i)).is_none()));
    }

    #[test]
    fn test_poisoned_lock_still_usable() {
        let registry = Arc::new(RequestRegistry::new());
        registry.register(h(1), "http://a", 1u64).unwrap();
        let poisoner = Arc::clone(&registry);
        let _ = thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(registry.claim(h(1)).is_some());
    }

    // ── Concurrency ──────────────────────────────────────────────────────

    #[test]
    fn test_concurrent_claims_win_once() {
        const HANDLES: i64 = 64;
        const CLAIMERS: usize = 8;

        for _ in 0..50 {
            let registry = Arc::new(RequestRegistry::new());
            for i in 0..HANDLES {
                registry.register(h(i), "http://a", i as u64).unwrap();
            }
            let wins = Arc::new(AtomicUsize::new(0));
            let barrier = Arc::new(Barrier::new(CLAIMERS + 1));

            let mut threads = Vec::new();
            for _ in 0..CLAIMERS {
                let registry = Arc::clone(&registry);
                let wins = Arc::clone(&wins);
                let barrier = Arc::clone(&barrier);
                threads.push(thread::spawn(move || {
                    barrier.wait();
                    for i in 0..HANDLES {
                        if registry.claim(h(i)).is_some() {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }));
            }
            let drainer = {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.drain().len()
                })
            };

            for t in threads {
                t.join().unwrap();
            }
            let drained = drainer.join().unwrap();
            assert_eq!(wins.load(Ordering::SeqCst) + drained, HANDLES as usize);
            assert!(registry.is_empty());
        }
    }
}
