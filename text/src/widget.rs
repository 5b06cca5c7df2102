//! The platform text widget as seen from the editor.

use ferry_types::Selection;

/// A change signal raised by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetChange {
    pub text: String,
    pub selection: Selection,
}

/// Platform text widget. Lives on, and is only touched from, the widget thread.
pub trait TextWidget {
    /// Replace the widget's content and selection.
    ///
    /// Platform widgets raise their change listeners synchronously while being
    /// written to; those signals are returned so the editor can classify them as
    /// echoes.
    fn apply(&mut self, text: &str, selection: Selection) -> Vec<WidgetChange>;

    /// Position the widget over the consumer's field, make it visible and focus it.
    fn show(&mut self, x: i32, y: i32, width: i32, height: i32);

    fn hide(&mut self);
}
