//! Shared text buffer and the input-method edits applied to it.
//!
//! All offsets are in characters (Unicode scalar values), clamped to the buffer.

use ferry_types::Selection;

/// Echo-suppression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    Idle,
    /// A write to the widget is in progress; widget change signals are echoes.
    ApplyingProgrammaticUpdate,
}

/// Buffer, selection and input-method composition shared by both update
/// directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextState {
    text: String,
    selection: Selection,
    composing: Option<(usize, usize)>,
    mode: SyncMode,
}

fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Cursor placement for commit/compose: positive values count from the end of the
/// inserted text (1 = just after it), others from its start.
fn cursor_after_insert(start: usize, inserted: usize, new_cursor: i32, len: usize) -> usize {
    let target = if new_cursor > 0 {
        (start + inserted) as i64 + i64::from(new_cursor) - 1
    } else {
        start as i64 + i64::from(new_cursor)
    };
    target.clamp(0, len as i64) as usize
}

impl TextState {
    #[must_use]
    pub fn new(text: &str, selection: Selection) -> Self {
        let mut state = Self::default();
        state.replace_all(text, selection);
        state
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[must_use]
    pub fn composing(&self) -> Option<(usize, usize)> {
        self.composing
    }

    #[must_use]
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: SyncMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Replace the whole buffer. Drops any composition.
    pub fn replace_all(&mut self, text: &str, selection: Selection) {
        self.text = text.to_string();
        self.selection = selection.clamp(self.char_len());
        self.composing = None;
    }

    /// Region an insertion replaces: the composing region, else the selection.
    fn target_region(&self) -> (usize, usize) {
        let len = self.char_len();
        let (lo, hi) = self.composing.unwrap_or_else(|| self.selection.ordered());
        (lo.min(len), hi.min(len))
    }

    fn replace_chars(&mut self, lo: usize, hi: usize, insert: &str) -> usize {
        let start = byte_index(&self.text, lo);
        let end = byte_index(&self.text, hi);
        self.text.replace_range(start..end, insert);
        insert.chars().count()
    }

    pub fn commit_text(&mut self, text: &str, new_cursor: i32) {
        let (lo, hi) = self.target_region();
        let inserted = self.replace_chars(lo, hi, text);
        self.composing = None;
        let cursor = cursor_after_insert(lo, inserted, new_cursor, self.char_len());
        self.selection = Selection::caret(cursor);
    }

    pub fn set_composing_text(&mut self, text: &str, new_cursor: i32) {
        let (lo, hi) = self.target_region();
        let inserted = self.replace_chars(lo, hi, text);
        self.composing = (inserted > 0).then_some((lo, lo + inserted));
        let cursor = cursor_after_insert(lo, inserted, new_cursor, self.char_len());
        self.selection = Selection::caret(cursor);
    }

    /// Keep the composed text and end composition. Returns whether a region existed.
    pub fn finish_composing(&mut self) -> bool {
        self.composing.take().is_some()
    }

    /// Delete `before` characters before the selection and `after` characters after
    /// it. Finishes composition first.
    pub fn delete_surrounding_text(&mut self, before: usize, after: usize) {
        self.finish_composing();
        let len = self.char_len();
        let (lo, hi) = self.selection.ordered();
        let (lo, hi) = (lo.min(len), hi.min(len));
        let tail_end = hi.saturating_add(after).min(len);
        let head_start = lo.saturating_sub(before);

        // Tail first so the head offsets stay valid.
        self.replace_chars(hi, tail_end, "");
        self.replace_chars(head_start, lo, "");

        let shift = lo - head_start;
        self.selection = Selection::new(
            self.selection.start.min(len) - shift,
            self.selection.end.min(len) - shift,
        );
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.char_len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_replaces_selection() {
        let mut state = TextState::new("hello world", Selection::new(6, 11));
        state.commit_text("there", 1);
        assert_eq!(state.text(), "hello there");
        assert_eq!(state.selection(), Selection::caret(11));
    }

    #[test]
    fn test_commit_replaces_composing_region() {
        let mut state = TextState::default();
        state.set_composing_text("caf", 1);
        assert_eq!(state.composing(), Some((0, 3)));

        state.set_composing_text("café", 1);
        assert_eq!(state.text(), "café");
        assert_eq!(state.composing(), Some((0, 4)));
        assert_eq!(state.selection(), Selection::caret(4));

        state.commit_text("café ", 1);
        assert_eq!(state.text(), "café ");
        assert_eq!(state.composing(), None);
        assert_eq!(state.selection(), Selection::caret(5));
    }

    #[test]
    fn test_cursor_relative_to_start() {
        let mut state = TextState::new("ab", Selection::caret(1));
        state.commit_text("XYZ", 0);
        assert_eq!(state.text(), "aXYZb");
        assert_eq!(state.selection(), Selection::caret(1));

        state.commit_text("-", -5);
        assert_eq!(state.selection(), Selection::caret(0));
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let mut state = TextState::new("日本語", Selection::caret(3));
        state.delete_surrounding_text(1, 0);
        assert_eq!(state.text(), "日本");
        assert_eq!(state.selection(), Selection::caret(2));
    }

    #[test]
    fn test_delete_surrounding_both_sides() {
        let mut state = TextState::new("abcdefg", Selection::new(3, 4));
        state.delete_surrounding_text(2, 2);
        assert_eq!(state.text(), "adg");
        assert_eq!(state.selection(), Selection::new(1, 2));
    }

    #[test]
    fn test_delete_surrounding_finishes_composition() {
        let mut state = TextState::new("", Selection::caret(0));
        state.set_composing_text("abc", 1);
        assert!(state.composing().is_some());
        state.delete_surrounding_text(1, 0);
        assert_eq!(state.composing(), None);
        assert_eq!(state.text(), "ab");
    }

    #[test]
    fn test_delete_clamps_at_edges() {
        let mut state = TextState::new("abc", Selection::caret(1));
        state.delete_surrounding_text(10, 1);
        assert_eq!(state.text(), "c");
        assert_eq!(state.selection(), Selection::caret(0));
    }

    #[test]
    fn test_selection_clamped_to_buffer() {
        let mut state = TextState::new("abc", Selection::new(1, 99));
        assert_eq!(state.selection(), Selection::new(1, 3));
        state.set_selection(Selection::new(50, 0));
        assert_eq!(state.selection(), Selection::new(3, 0));
    }

    #[test]
    fn test_empty_composing_text_clears_region() {
        let mut state = TextState::new("ab", Selection::caret(2));
        state.set_composing_text("c", 1);
        state.set_composing_text("", 1);
        assert_eq!(state.text(), "ab");
        assert_eq!(state.composing(), None);
    }
}
