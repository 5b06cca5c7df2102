//! Ferry engine: how events reach the native consumer, and how the consumer reaches
//! the widget thread.
//!
//! Two one-way queues carry every cross-thread handoff in the bridge:
//!
//! - [`ChannelSink`] → [`EventPump`]: any thread delivers a [`ConsumerEvent`];
//!   only the consumer thread drains them into a [`Consumer`].
//! - [`UiDispatcher`] → [`UiLoop`]: any thread posts a job; only the thread that
//!   owns the UI state runs it.
//!
//! [`ConsumerEvent`]: ferry_types::ConsumerEvent

mod consumer;
mod dispatch;
mod sink;

pub use consumer::{Consumer, dispatch_event};
pub use dispatch::{UiDispatcher, UiJob, UiLoop, ui_channel};
pub use sink::{ChannelSink, EventPump, event_channel};
