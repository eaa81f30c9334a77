//! The editable document the engine reads from and writes to.

use crate::types::TextRange;

/// Host-side text with a selection.
///
/// All positions are byte offsets into the text. An empty selection is a
/// caret.
pub trait TextBuffer {
    /// Replace the selection with `replacement` (insert at the caret when the
    /// selection is empty). Afterwards the selection either covers the
    /// inserted text or, with `collapse_to_inserted`, is a caret after it.
    fn replace_selection(&mut self, replacement: &str, collapse_to_inserted: bool);

    /// Bring the selection into view.
    fn scroll_selection_into_view(&mut self);

    /// Current selection.
    fn selection(&self) -> TextRange;

    /// Select `[start, end)`.
    fn set_selection_range(&mut self, start: usize, end: usize);

    /// Replace the whole text. The selection collapses to the start.
    fn set_text(&mut self, text: String);

    /// Current text.
    fn text(&self) -> String;
}

/// A `TextBuffer` held in memory, used by the command line and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    /// Offset of the last selection scrolled into view.
    scrolled_to: Option<usize>,
    /// Current selection.
    selection: TextRange,
    /// Document text.
    text: String,
}

impl MemoryBuffer {
    /// Move `offset` into the text and back onto a character boundary.
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset = offset.saturating_sub(1);
        }
        return offset;
    }

    /// Consume the buffer, returning its text.
    pub fn into_text(self) -> String {
        return self.text;
    }

    /// A buffer holding `text` with the caret at the start.
    pub fn new(text: impl Into<String>) -> Self {
        return Self {
            scrolled_to: None,
            selection: 0..0,
            text: text.into(),
        };
    }

    /// Where the last `scroll_selection_into_view` pointed, if anywhere.
    pub const fn scrolled_to(&self) -> Option<usize> {
        return self.scrolled_to;
    }
}

impl TextBuffer for MemoryBuffer {
    fn replace_selection(&mut self, replacement: &str, collapse_to_inserted: bool) {
        let start = self.clamp(self.selection.start);
        let end = self.clamp(self.selection.end).max(start);
        self.text.replace_range(start..end, replacement);
        let inserted_end = start.saturating_add(replacement.len());
        self.selection = if collapse_to_inserted {
            inserted_end..inserted_end
        } else {
            start..inserted_end
        };
        return;
    }

    fn scroll_selection_into_view(&mut self) {
        self.scrolled_to = Some(self.selection.start);
        return;
    }

    fn selection(&self) -> TextRange {
        return self.selection.clone();
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);
        self.selection = start..end;
        return;
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
        self.selection = 0..0;
        return;
    }

    fn text(&self) -> String {
        return self.text.clone();
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;

    #[test]
    fn replace_selection_inserts_at_caret() {
        let mut buffer = MemoryBuffer::new("ab");
        buffer.set_selection_range(1, 1);
        buffer.replace_selection("XY", false);
        assert_eq!(buffer.text(), "aXYb");
        assert_eq!(buffer.selection(), 1..3);
    }

    #[test]
    fn replace_selection_replaces_range_and_collapses() {
        let mut buffer = MemoryBuffer::new("hello world");
        buffer.set_selection_range(6, 11);
        buffer.replace_selection("there", true);
        assert_eq!(buffer.text(), "hello there");
        assert_eq!(buffer.selection(), 11..11);
    }

    #[test]
    fn selection_is_clamped_to_char_boundaries() {
        let mut buffer = MemoryBuffer::new("añb");
        buffer.set_selection_range(2, 99);
        assert_eq!(buffer.selection(), 1..4);
        buffer.set_selection_range(3, 1);
        assert_eq!(buffer.selection(), 3..3);
    }

    #[test]
    fn scroll_records_selection_start() {
        let mut buffer = MemoryBuffer::new("text");
        assert_eq!(buffer.scrolled_to(), None);
        buffer.set_selection_range(2, 4);
        buffer.scroll_selection_into_view();
        assert_eq!(buffer.scrolled_to(), Some(2));
    }
}
