//! Single-line text input with a cursor

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Editing operation on the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdit {
    /// Insert a character at the cursor
    Insert(char),
    /// Delete the character before the cursor
    Backspace,
    /// Delete the character under the cursor
    Delete,
    /// Delete the word before the cursor
    DeleteWord,
    /// Delete everything before the cursor
    DeleteToStart,
    /// Move one character left
    Left,
    /// Move one character right
    Right,
    /// Move to the start of the line
    Home,
    /// Move to the end of the line
    End,
}

impl InputEdit {
    /// Maps a key press to an edit, if it is one
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('w') if ctrl => Some(InputEdit::DeleteWord),
            KeyCode::Char('u') if ctrl => Some(InputEdit::DeleteToStart),
            KeyCode::Char('a') if ctrl => Some(InputEdit::Home),
            KeyCode::Char('e') if ctrl => Some(InputEdit::End),
            KeyCode::Char(_) if ctrl => None,
            KeyCode::Char(c) => Some(InputEdit::Insert(c)),
            KeyCode::Backspace => Some(InputEdit::Backspace),
            KeyCode::Delete => Some(InputEdit::Delete),
            KeyCode::Left => Some(InputEdit::Left),
            KeyCode::Right => Some(InputEdit::Right),
            KeyCode::Home => Some(InputEdit::Home),
            KeyCode::End => Some(InputEdit::End),
            _ => None,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Text typed at the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    value: String,
    cursor: usize,
}

impl InputField {
    /// Creates an empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns true when nothing has been typed
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replaces the text and moves the cursor to the end
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    /// Clears the text, returning what was there
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    /// Applies one edit
    pub fn apply(&mut self, edit: InputEdit) {
        let char_count = self.value.chars().count();
        match edit {
            InputEdit::Insert(c) => {
                // Newlines from pasted text would break the single-line prompt
                let c = if c == '\n' || c == '\r' { ' ' } else { c };
                let byte_pos = char_to_byte_index(&self.value, self.cursor);
                self.value.insert(byte_pos, c);
                self.cursor += 1;
            }
            InputEdit::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            InputEdit::Delete => {
                if self.cursor < char_count {
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            InputEdit::DeleteWord => {
                let end = char_to_byte_index(&self.value, self.cursor);
                let before = &self.value[..end];
                let trimmed = before.trim_end();
                let start = trimmed
                    .rfind(char::is_whitespace)
                    .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
                    .unwrap_or(0);
                let removed = self.value[start..end].chars().count();
                self.value.replace_range(start..end, "");
                self.cursor -= removed;
            }
            InputEdit::DeleteToStart => {
                let end = char_to_byte_index(&self.value, self.cursor);
                self.value.replace_range(..end, "");
                self.cursor = 0;
            }
            InputEdit::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            InputEdit::Right => {
                self.cursor = (self.cursor + 1).min(char_count);
            }
            InputEdit::Home => self.cursor = 0,
            InputEdit::End => self.cursor = char_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputField {
        let mut field = InputField::new();
        for c in text.chars() {
            field.apply(InputEdit::Insert(c));
        }
        field
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut field = typed("héllo");
        assert_eq!(field.cursor(), 5);
        field.apply(InputEdit::Left);
        field.apply(InputEdit::Left);
        field.apply(InputEdit::Left);
        field.apply(InputEdit::Backspace);
        assert_eq!(field.value(), "hllo");
        assert_eq!(field.cursor(), 1);
        field.apply(InputEdit::Insert('ë'));
        assert_eq!(field.value(), "hëllo");
    }

    #[test]
    fn test_delete_and_bounds() {
        let mut field = typed("ab");
        field.apply(InputEdit::Right);
        assert_eq!(field.cursor(), 2);
        field.apply(InputEdit::Delete);
        assert_eq!(field.value(), "ab");
        field.apply(InputEdit::Home);
        field.apply(InputEdit::Delete);
        assert_eq!(field.value(), "b");
        field.apply(InputEdit::Backspace);
        assert_eq!(field.value(), "b");
    }

    #[test]
    fn test_delete_word() {
        let mut field = typed("find all  files  ");
        field.apply(InputEdit::DeleteWord);
        assert_eq!(field.value(), "find all  ");
        assert_eq!(field.cursor(), 10);
        field.apply(InputEdit::DeleteWord);
        field.apply(InputEdit::DeleteWord);
        assert_eq!(field.value(), "");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_delete_to_start_and_take() {
        let mut field = typed("list files");
        field.apply(InputEdit::Left);
        field.apply(InputEdit::DeleteToStart);
        assert_eq!(field.value(), "s");
        assert_eq!(field.take(), "s");
        assert!(field.is_empty());
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_newlines_become_spaces() {
        let field = typed("a\nb");
        assert_eq!(field.value(), "a b");
    }

    #[test]
    fn test_key_mapping() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);
        assert_eq!(
            InputEdit::from_key(key(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(InputEdit::Insert('x'))
        );
        assert_eq!(
            InputEdit::from_key(key(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some(InputEdit::Insert('X'))
        );
        assert_eq!(
            InputEdit::from_key(key(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            Some(InputEdit::DeleteWord)
        );
        assert_eq!(
            InputEdit::from_key(key(KeyCode::Char('k'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(InputEdit::from_key(key(KeyCode::Tab, KeyModifiers::NONE)), None);
    }
}
