use super::wrap::clamp_to_char_boundary_left;

/// Single prompt buffer with UTF-8 safe cursor movement and recall of
/// previously submitted prompts.
#[derive(Debug, Default)]
pub struct InputLine {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    stash: Option<String>,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn insert_str(&mut self, value: &str) {
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_boundary(end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_boundary(start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary(self.cursor);
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_boundary(self.cursor);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Takes the trimmed buffer. Blank input is kept and yields `None`.
    pub fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        if self.history.last() != Some(&value) {
            self.history.push(value.clone());
        }
        self.history_index = None;
        self.stash = None;
        self.buffer.clear();
        self.cursor = 0;
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index.is_none() {
            self.stash = Some(self.buffer.clone());
        }
        let index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(index);
        self.replace(self.history[index].clone());
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 >= self.history.len() {
            self.history_index = None;
            let stash = self.stash.take().unwrap_or_default();
            self.replace(stash);
        } else {
            self.history_index = Some(idx + 1);
            self.replace(self.history[idx + 1].clone());
        }
    }

    fn replace(&mut self, value: String) {
        self.buffer = value;
        self.cursor = self.buffer.len();
    }

    fn prev_boundary(&self, idx: usize) -> usize {
        let idx = clamp_to_char_boundary_left(&self.buffer, idx);
        self.buffer[..idx]
            .char_indices()
            .next_back()
            .map(|(pos, _)| pos)
            .unwrap_or(0)
    }

    fn next_boundary(&self, idx: usize) -> usize {
        let idx = clamp_to_char_boundary_left(&self.buffer, idx);
        match self.buffer[idx..].chars().next() {
            Some(ch) => idx + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut input = InputLine::new();
        input.insert_str("héllo→");
        input.backspace();
        assert_eq!(input.buffer(), "héllo");
        input.move_home();
        input.move_right();
        input.delete();
        assert_eq!(input.buffer(), "hllo");
        input.move_left();
        input.insert_str("é");
        assert_eq!(input.buffer(), "éhllo");
        assert_eq!(input.cursor(), "é".len());
    }

    #[test]
    fn submit_trims_and_skips_blank_input() {
        let mut input = InputLine::new();
        input.insert_str("   ");
        assert_eq!(input.submit(), None);
        input.insert_str(" list files ");
        assert_eq!(input.submit().as_deref(), Some("list files"));
        assert!(input.is_empty());
    }

    #[test]
    fn history_recall_restores_draft() {
        let mut input = InputLine::new();
        input.insert_str("first");
        input.submit();
        input.insert_str("second");
        input.submit();
        input.insert_str("draft");

        input.history_up();
        assert_eq!(input.buffer(), "second");
        input.history_up();
        input.history_up();
        assert_eq!(input.buffer(), "first");
        input.history_down();
        assert_eq!(input.buffer(), "second");
        input.history_down();
        assert_eq!(input.buffer(), "draft");
    }
}
