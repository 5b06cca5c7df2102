//! Core domain types for Ferry.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the bridge: the network, text and
//! location components produce [`ConsumerEvent`]s, and the engine carries them to the
//! native consumer through an [`EventSink`].

#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod event;
mod location;
mod request;
mod text;

pub use event::{ConsumerEvent, EventSink, KeyCode, KeyDirection};
pub use location::{
    GpsStatus, LocationFix, OrientationSample, ProviderId, SensorRate, UnknownProviderError,
};
pub use request::{RequestHandle, RequestOutcome};
pub use text::Selection;
