//! The editable target text and its cursor.
//!
//! Offsets are counted in chars so that an anchor computed before a
//! suggestion request still points at the same place when the result lands.

/// Target text being edited, with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorDocument {
    text: String,
    cursor: usize,
}

impl EditorDocument {
    /// Cursor starts at the end of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text before and after the char offset `at` (clamped to the end).
    pub fn split_at(&self, at: usize) -> (&str, &str) {
        self.text.split_at(self.byte_index(at))
    }

    fn byte_index(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Insert at the cursor and move the cursor past the insertion.
    pub fn insert(&mut self, text: &str) -> bool {
        self.insert_at(self.cursor, text)
    }

    /// Insert at `offset` and leave the cursor after the inserted text.
    pub fn insert_at(&mut self, offset: usize, text: &str) -> bool {
        if text.is_empty() || offset > self.char_len() {
            return false;
        }
        let at = self.byte_index(offset);
        self.text.insert_str(at, text);
        self.cursor = offset + text.chars().count();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Start of the cursor's line.
    pub fn move_line_start(&mut self) -> bool {
        let (before, _) = self.split_at(self.cursor);
        let line_start = before
            .rfind('\n')
            .map_or(0, |i| before[..=i].chars().count());
        self.set_cursor(line_start)
    }

    /// End of the cursor's line.
    pub fn move_line_end(&mut self) -> bool {
        let (_, after) = self.split_at(self.cursor);
        let rest = after.find('\n').map_or(after, |i| &after[..i]);
        self.set_cursor(self.cursor + rest.chars().count())
    }

    fn set_cursor(&mut self, cursor: usize) -> bool {
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }
}
