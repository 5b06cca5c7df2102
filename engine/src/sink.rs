//! Consumer event path: many producers, one consumer thread.

use tokio::sync::mpsc;

use ferry_types::{ConsumerEvent, EventSink};

use crate::consumer::{Consumer, dispatch_event};

/// Create a connected sink/pump pair.
#[must_use]
pub fn event_channel() -> (ChannelSink, EventPump) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, EventPump { rx })
}

/// [`EventSink`] that enqueues events for the consumer thread.
///
/// Delivery never blocks and never runs consumer code. Cloning is cheap; the pump
/// reports end-of-stream once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ConsumerEvent>,
}

impl ChannelSink {
    /// Whether the pump has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: ConsumerEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::trace!(event = name, "Consumer event path closed; event dropped");
        }
    }
}

/// Consumer-thread end of the event path.
#[derive(Debug)]
pub struct EventPump {
    rx: mpsc::UnboundedReceiver<ConsumerEvent>,
}

impl EventPump {
    /// Deliver queued events to `consumer`, up to `budget`.
    ///
    /// Non-blocking: returns as soon as the queue is empty.
    pub fn poll_events(&mut self, budget: usize, consumer: &mut dyn Consumer) -> usize {
        let mut count = 0;
        while count < budget {
            match self.rx.try_recv() {
                Ok(event) => {
                    dispatch_event(consumer, event);
                    count += 1;
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        count
    }

    /// Next queued event without blocking.
    pub fn try_next(&mut self) -> Option<ConsumerEvent> {
        self.rx.try_recv().ok()
    }

    /// Block the calling thread until an event arrives.
    ///
    /// Returns `None` once every sink is dropped and the queue is empty. Must not be
    /// called from inside an async runtime.
    pub fn wait_next(&mut self) -> Option<ConsumerEvent> {
        self.rx.blocking_recv()
    }

    /// Async counterpart of [`EventPump::wait_next`].
    pub async fn next(&mut self) -> Option<ConsumerEvent> {
        self.rx.recv().await
    }

    /// Block and dispatch until every sink is dropped. Returns the number of events.
    pub fn run(&mut self, consumer: &mut dyn Consumer) -> usize {
        let mut count = 0;
        while let Some(event) = self.wait_next() {
            dispatch_event(consumer, event);
            count += 1;
        }
        count
    }
}
