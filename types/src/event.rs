//! Events delivered to the native consumer and the sink that carries them.

use std::sync::Arc;

use crate::location::{GpsStatus, LocationFix, OrientationSample};
use crate::request::{RequestHandle, RequestOutcome};
use crate::text::Selection;

/// Key code forwarded through `onKeyEvent`.
///
/// Values follow the consumer's key table; `KEYBOARD_CLOSED` has no physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(i32);

impl KeyCode {
    pub const BACK: Self = Self(256);
    pub const ENTER: Self = Self(257);
    pub const DELETE: Self = Self(259);
    pub const KEYBOARD_CLOSED: Self = Self(-1);

    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Direction of a key event: down = 1, up = -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    Down,
    Up,
}

impl KeyDirection {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Down => 1,
            Self::Up => -1,
        }
    }
}

/// Everything the bridge can tell the native consumer.
///
/// Each variant maps to one consumer entry point:
///
/// | Variant | Entry point |
/// |---------|-------------|
/// | `RequestComplete` | `onRequestComplete(handle, bytes, errorMessage)` |
/// | `TextChanged` | `onTextChanged(text, selStart, selEnd)` |
/// | `Key` | `onKeyEvent(code, direction)` |
/// | `Location` | `onLocationUpdate(...)` |
/// | `Orientation` | `onOrientationUpdate(timeMs, azimuth, pitch, roll)` |
/// | `GpsStatus` | `onGpsStatus(satellitesVisible, satellitesUsed)` |
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerEvent {
    RequestComplete {
        handle: RequestHandle,
        outcome: RequestOutcome,
    },
    TextChanged {
        text: String,
        selection: Selection,
    },
    Key {
        code: KeyCode,
        direction: KeyDirection,
    },
    Location(LocationFix),
    Orientation(OrientationSample),
    GpsStatus(GpsStatus),
}

impl ConsumerEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestComplete { .. } => "onRequestComplete",
            Self::TextChanged { .. } => "onTextChanged",
            Self::Key { .. } => "onKeyEvent",
            Self::Location(_) => "onLocationUpdate",
            Self::Orientation(_) => "onOrientationUpdate",
            Self::GpsStatus(_) => "onGpsStatus",
        }
    }
}

/// The single logical path into the consumer.
///
/// Implementations must be callable from any thread and must not run consumer code
/// in-line: delivery marshals the event into the consumer's own event path.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: ConsumerEvent);

    /// Synthetic key-down followed by key-up.
    fn deliver_key_press(&self, code: KeyCode) {
        self.deliver(ConsumerEvent::Key {
            code,
            direction: KeyDirection::Down,
        });
        self.deliver(ConsumerEvent::Key {
            code,
            direction: KeyDirection::Up,
        });
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn deliver(&self, event: ConsumerEvent) {
        (**self).deliver(event);
    }
}
