//! The native consumer's entry points.

use ferry_types::{
    ConsumerEvent, GpsStatus, KeyCode, KeyDirection, LocationFix, OrientationSample,
    RequestHandle, Selection,
};

/// Entry points of the native consumer, one per [`ConsumerEvent`] variant.
///
/// All methods run on the consumer thread. Defaults ignore the event so a consumer
/// only implements what it subscribes to.
pub trait Consumer {
    /// `bytes` is set on success, `error` on failure; both are `None` when the
    /// request was cancelled.
    fn on_request_complete(
        &mut self,
        handle: RequestHandle,
        bytes: Option<Vec<u8>>,
        error: Option<String>,
    ) {
        let _ = (handle, bytes, error);
    }

    fn on_text_changed(&mut self, text: &str, selection: Selection) {
        let _ = (text, selection);
    }

    fn on_key_event(&mut self, code: KeyCode, direction: KeyDirection) {
        let _ = (code, direction);
    }

    fn on_location_update(&mut self, fix: &LocationFix) {
        let _ = fix;
    }

    /// `sample.azimuth` is already corrected for magnetic declination.
    fn on_orientation_update(&mut self, sample: &OrientationSample) {
        let _ = sample;
    }

    fn on_gps_status(&mut self, status: GpsStatus) {
        let _ = status;
    }
}

/// Route one event to the matching consumer entry point.
pub fn dispatch_event(consumer: &mut dyn Consumer, event: ConsumerEvent) {
    match event {
        ConsumerEvent::RequestComplete { handle, outcome } => {
            let (bytes, error) = outcome.into_parts();
            consumer.on_request_complete(handle, bytes, error);
        }
        ConsumerEvent::TextChanged { text, selection } => {
            consumer.on_text_changed(&text, selection);
        }
        ConsumerEvent::Key { code, direction } => consumer.on_key_event(code, direction),
        ConsumerEvent::Location(fix) => consumer.on_location_update(&fix),
        ConsumerEvent::Orientation(sample) => consumer.on_orientation_update(&sample),
        ConsumerEvent::GpsStatus(status) => consumer.on_gps_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_types::{ProviderId, RequestOutcome};

    #[derive(Default)]
    struct Calls(Vec<String>);

    impl Consumer for Calls {
        fn on_request_complete(
            &mut self,
            handle: RequestHandle,
            bytes: Option<Vec<u8>>,
            error: Option<String>,
        ) {
            self.0.push(format!(
                "complete {handle} {:?} {:?}",
                bytes.map(|b| b.len()),
                error
            ));
        }

        fn on_key_event(&mut self, code: KeyCode, direction: KeyDirection) {
            self.0
                .push(format!("key {} {}", code.get(), direction.as_i32()));
        }
    }

    #[test]
    fn test_cancelled_request_has_neither_bytes_nor_error() {
        let mut calls = Calls::default();
        dispatch_event(
            &mut calls,
            ConsumerEvent::RequestComplete {
                handle: RequestHandle::new(42),
                outcome: RequestOutcome::Cancelled,
            },
        );
        assert_eq!(calls.0, vec!["complete 42 None None"]);
    }

    #[test]
    fn test_failure_passes_message() {
        let mut calls = Calls::default();
        dispatch_event(
            &mut calls,
            ConsumerEvent::RequestComplete {
                handle: RequestHandle::new(7),
                outcome: RequestOutcome::Failure("timed out".to_string()),
            },
        );
        assert_eq!(calls.0, vec!["complete 7 None Some(\"timed out\")"]);
    }

    #[test]
    fn test_key_event_values() {
        let mut calls = Calls::default();
        dispatch_event(
            &mut calls,
            ConsumerEvent::Key {
                code: KeyCode::KEYBOARD_CLOSED,
                direction: KeyDirection::Up,
            },
        );
        assert_eq!(calls.0, vec!["key -1 -1"]);
    }

    #[test]
    fn test_unhandled_events_are_ignored() {
        let mut calls = Calls::default();
        dispatch_event(
            &mut calls,
            ConsumerEvent::Location(LocationFix::at(ProviderId::Gps, 0, 1.0, 2.0)),
        );
        assert!(calls.0.is_empty());
    }
}
