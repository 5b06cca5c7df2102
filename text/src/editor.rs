//! Widget-thread side of the text bridge.

use std::sync::Arc;

use ferry_types::{ConsumerEvent, EventSink, KeyCode, Selection};

use crate::state::{SyncMode, TextState};
use crate::widget::{TextWidget, WidgetChange};

/// Whether the widget is on screen and taking input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Editing,
}

/// Owns the widget and the shared [`TextState`]; acts as the input-method
/// connection.
///
/// Must only be used on the widget thread. Consumer calls reach it through
/// [`TextInputHandle`](crate::TextInputHandle).
pub struct TextEditor<W> {
    widget: W,
    state: TextState,
    visibility: Visibility,
    sink: Arc<dyn EventSink>,
}

impl<W: TextWidget> TextEditor<W> {
    pub fn new(widget: W, sink: Arc<dyn EventSink>) -> Self {
        Self {
            widget,
            state: TextState::default(),
            visibility: Visibility::Hidden,
            sink,
        }
    }

    #[must_use]
    pub fn state(&self) -> &TextState {
        &self.state
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn show(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.widget.show(x, y, width, height);
        self.visibility = Visibility::Editing;
        tracing::debug!(x, y, width, height, "Text input shown");
    }

    pub fn hide(&mut self) {
        self.widget.hide();
        self.visibility = Visibility::Hidden;
        self.state.finish_composing();
        tracing::debug!("Text input hidden");
    }

    /// Programmatic write from the consumer. Never echoed back.
    pub fn set_text(&mut self, text: &str, selection: Selection) {
        self.state.replace_all(text, selection);
        self.mirror_to_widget();
    }

    /// Change signal from the widget itself (typing that bypasses the input method,
    /// selection drags, and the echoes of our own writes).
    pub fn on_widget_changed(&mut self, change: WidgetChange) {
        if self.state.mode() == SyncMode::ApplyingProgrammaticUpdate {
            tracing::trace!("Suppressed widget echo");
            return;
        }
        self.state.replace_all(&change.text, change.selection);
        self.notify();
    }

    // ── Input-method connection ─────────────────────────────────────────

    pub fn commit_text(&mut self, text: &str, new_cursor: i32) {
        self.state.commit_text(text, new_cursor);
        self.commit_edit();
    }

    pub fn set_composing_text(&mut self, text: &str, new_cursor: i32) {
        self.state.set_composing_text(text, new_cursor);
        self.commit_edit();
    }

    pub fn finish_composing(&mut self) {
        self.state.finish_composing();
    }

    /// A single backspace on an empty buffer has nothing to delete; the consumer gets
    /// a Delete key press instead so it can act on it (e.g. leave the field).
    pub fn delete_surrounding_text(&mut self, before: usize, after: usize) {
        if self.state.char_len() == 0 && before == 1 && after == 0 {
            self.state.finish_composing();
            self.sink.deliver_key_press(KeyCode::DELETE);
            return;
        }
        self.state.delete_surrounding_text(before, after);
        self.commit_edit();
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.state.set_selection(Selection::new(start, end));
        self.commit_edit();
    }

    /// The keyboard's done/enter action.
    pub fn perform_editor_action(&mut self) {
        self.state.finish_composing();
        self.sink.deliver_key_press(KeyCode::ENTER);
    }

    /// Platform back key. Returns `true` when consumed.
    pub fn on_back_key(&mut self) -> bool {
        if self.visibility != Visibility::Editing {
            return false;
        }
        self.sink.deliver_key_press(KeyCode::BACK);
        true
    }

    pub fn on_focus_changed(&mut self, focused: bool) {
        if focused || self.visibility != Visibility::Editing {
            return;
        }
        tracing::debug!("Text input lost focus; keyboard closed");
        self.visibility = Visibility::Hidden;
        self.state.finish_composing();
        self.sink.deliver_key_press(KeyCode::KEYBOARD_CLOSED);
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn mirror_to_widget(&mut self) {
        self.state.set_mode(SyncMode::ApplyingProgrammaticUpdate);
        let echoes = self
            .widget
            .apply(self.state.text(), self.state.selection());
        for echo in echoes {
            self.on_widget_changed(echo);
        }
        self.state.set_mode(SyncMode::Idle);
    }

    fn commit_edit(&mut self) {
        self.mirror_to_widget();
        self.notify();
    }

    fn notify(&self) {
        self.sink.deliver(ConsumerEvent::TextChanged {
            text: self.state.text().to_string(),
            selection: self.state.selection(),
        });
    }
}
