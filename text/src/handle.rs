//! Consumer-thread side of the text bridge.

use ferry_engine::UiDispatcher;
use ferry_types::Selection;

use crate::editor::TextEditor;
use crate::widget::TextWidget;

/// Fire-and-forget commands for the widget thread.
///
/// Each call is queued on the widget thread's loop and returns immediately.
pub struct TextInputHandle<W> {
    dispatcher: UiDispatcher<TextEditor<W>>,
}

impl<W> Clone for TextInputHandle<W> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<W: TextWidget + 'static> TextInputHandle<W> {
    #[must_use]
    pub fn new(dispatcher: UiDispatcher<TextEditor<W>>) -> Self {
        Self { dispatcher }
    }

    pub fn show(&self, x: i32, y: i32, width: i32, height: i32) {
        self.dispatcher
            .post(move |editor: &mut TextEditor<W>| editor.show(x, y, width, height));
    }

    pub fn hide(&self) {
        self.dispatcher.post(|editor: &mut TextEditor<W>| editor.hide());
    }

    pub fn set_text(&self, text: impl Into<String>, sel_start: usize, sel_end: usize) {
        let text = text.into();
        self.dispatcher.post(move |editor: &mut TextEditor<W>| {
            editor.set_text(&text, Selection::new(sel_start, sel_end));
        });
    }
}
