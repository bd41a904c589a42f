//! Input field handling for the terminal user interface.

/// A single-line text input with cursor position and active state.
///
/// The cursor is a byte offset that always sits on a char boundary, so
/// editing is safe for non-ASCII titles and names.
#[derive(Clone, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.len(),
            active: false,
        }
    }

    /// Replace the content, moving the cursor to the end.
    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if let Some(prev) = self.value[..self.cursor].chars().next_back() {
            let start = self.cursor - prev.len_utf8();
            self.value.remove(start);
            self.cursor = start;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    /// Move cursor one character to the left.
    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    /// Move cursor one character to the right.
    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.value[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_and_backspace() {
        let mut field = InputField::new();
        for c in "plan".chars() {
            field.handle_char(c);
        }
        assert_eq!(field.value, "plan");
        field.handle_backspace();
        assert_eq!(field.value, "pla");
        assert_eq!(field.cursor, 3);
    }

    #[test]
    fn editing_mid_string() {
        let mut field = InputField::with_value("pln");
        field.move_cursor_left();
        field.handle_char('a');
        assert_eq!(field.value, "plan");
    }

    #[test]
    fn cursor_stays_on_char_boundaries() {
        let mut field = InputField::with_value("kafé");
        field.handle_backspace();
        assert_eq!(field.value, "kaf");
        field.handle_char('é');
        field.move_cursor_left();
        field.move_cursor_right();
        assert_eq!(field.value, "kafé");
    }
}
