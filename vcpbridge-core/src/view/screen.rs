//! Character screen buffer
//!
//! 128x64 panel with a 6x8 font: 8 rows of 21 characters.

use heapless::String;

/// Number of character rows
pub const SCREEN_ROWS: usize = 8;

/// Number of character columns
pub const SCREEN_COLS: usize = 21;

/// Text screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    lines: [String<SCREEN_COLS>; SCREEN_ROWS],
    /// Set on every change, cleared by whoever pushes the screen out
    dirty: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    /// Create a new empty screen
    pub const fn new() -> Self {
        Self {
            lines: [
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
            dirty: true,
        }
    }

    /// Clear the screen
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.dirty = true;
    }

    /// Set text at a row, truncated to the screen width
    pub fn set_line(&mut self, row: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(row) {
            let text = truncate(text, SCREEN_COLS);
            if line.as_str() != text {
                line.clear();
                let _ = line.push_str(text);
                self.dirty = true;
            }
        }
    }

    /// Set a row from a left part and a right-aligned part
    ///
    /// The right part wins when both do not fit.
    pub fn set_split(&mut self, row: usize, left: &str, right: &str) {
        let right = truncate(right, SCREEN_COLS);
        let left = truncate(left, SCREEN_COLS - right.len());

        let mut buf: String<SCREEN_COLS> = String::new();
        let _ = buf.push_str(left);
        for _ in 0..(SCREEN_COLS - left.len() - right.len()) {
            let _ = buf.push(' ');
        }
        let _ = buf.push_str(right);
        self.set_line(row, &buf);
    }

    /// Get a line of text
    pub fn get_line(&self, row: usize) -> &str {
        self.lines.get(row).map(|l| l.as_str()).unwrap_or("")
    }

    /// Check if the screen changed since the last [`Screen::mark_clean`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Iterate over non-empty rows
    pub fn rows(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_empty())
            .map(|(i, l)| (i, l.as_str()))
    }
}

/// Cut `text` to at most `max` bytes on a char boundary
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_line_truncates() {
        let mut screen = Screen::new();
        screen.set_line(0, "0123456789012345678901234");
        assert_eq!(screen.get_line(0), "012345678901234567890");
        assert_eq!(screen.get_line(99), "");
    }

    #[test]
    fn test_split_alignment() {
        let mut screen = Screen::new();
        screen.set_split(1, "TX:", "42 B.");
        assert_eq!(screen.get_line(1), "TX:             42 B.");
        assert_eq!(screen.get_line(1).len(), SCREEN_COLS);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut screen = Screen::new();
        screen.set_line(2, "hello");
        screen.mark_clean();
        screen.set_line(2, "hello");
        assert!(!screen.is_dirty());
        screen.set_line(2, "world");
        assert!(screen.is_dirty());
    }
}
