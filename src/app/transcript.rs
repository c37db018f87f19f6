use crate::state::{Message, MessageKind};

pub const WELCOME_TEXT: &str = "Welcome! Ask about your project. F2 model · F3 confirmations · F4 thinking · Ctrl+T collapse · Ctrl+L clear · Esc quit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Welcome,
    User,
    Agent,
    Tool,
    Thought,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub content: String,
    pub is_error: bool,
    /// Only honoured for collapsible entries.
    pub collapsed: bool,
}

impl TranscriptEntry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            is_error: false,
            collapsed: false,
        }
    }

    pub fn agent_error(content: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Agent,
            content: content.into(),
            is_error: true,
            collapsed: false,
        }
    }

    /// Tool and thought entries may be folded to their first line.
    pub fn is_collapsible(&self) -> bool {
        matches!(self.kind, EntryKind::Tool | EntryKind::Thought)
    }

    pub fn is_folded(&self) -> bool {
        self.collapsed && self.is_collapsible()
    }
}

impl From<Message> for TranscriptEntry {
    fn from(message: Message) -> Self {
        let kind = match message.kind {
            MessageKind::User => EntryKind::User,
            MessageKind::Agent | MessageKind::TextFragment => EntryKind::Agent,
            MessageKind::Tool => EntryKind::Tool,
            MessageKind::Thought => EntryKind::Thought,
        };
        // Tool and thought output arrives folded.
        let collapsed = matches!(kind, EntryKind::Tool | EntryKind::Thought);
        Self {
            kind,
            content: message.content,
            is_error: message.is_error,
            collapsed,
        }
    }
}

/// Ordered, capped list of rendered entries with at most one Agent entry
/// receiving streamed text.
#[derive(Debug)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    streaming: Option<usize>,
    interrupted: bool,
    cap: usize,
}

impl Transcript {
    pub fn new(cap: usize) -> Self {
        let mut transcript = Self {
            entries: Vec::new(),
            streaming: None,
            interrupted: false,
            cap: cap.max(1),
        };
        transcript.reset();
        transcript
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn streaming_index(&self) -> Option<usize> {
        self.streaming
    }

    /// Back to a lone welcome entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries
            .push(TranscriptEntry::new(EntryKind::Welcome, WELCOME_TEXT));
        self.streaming = None;
        self.interrupted = false;
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
        self.enforce_cap();
    }

    /// Appends the user's entry and an empty in-progress Agent entry after it.
    pub fn begin_turn(&mut self, input: &str) {
        self.push(TranscriptEntry::new(EntryKind::User, input));
        self.entries.push(TranscriptEntry::new(EntryKind::Agent, ""));
        self.streaming = Some(self.entries.len() - 1);
        self.interrupted = false;
        self.enforce_cap();
    }

    pub fn append_text(&mut self, chunk: &str) {
        let Some(entry) = self.streaming.and_then(|idx| self.entries.get_mut(idx)) else {
            return;
        };
        if self.interrupted && !entry.content.is_empty() {
            entry.content.push_str("\n\n");
        }
        entry.content.push_str(chunk);
        self.interrupted = false;
    }

    /// Places a tool or thought entry ahead of the in-progress answer.
    pub fn insert_before_streaming(&mut self, entry: TranscriptEntry) {
        match self.streaming {
            Some(idx) => {
                self.entries.insert(idx, entry);
                self.streaming = Some(idx + 1);
                self.interrupted = true;
                self.enforce_cap();
            }
            None => self.push(entry),
        }
    }

    /// Closes the in-progress entry and appends the error-flagged Agent
    /// messages of the turn. A transcript with no open turn is left alone.
    pub fn finalize(&mut self, messages: &[Message]) {
        let Some(idx) = self.streaming.take() else {
            return;
        };
        self.interrupted = false;
        if self
            .entries
            .get(idx)
            .is_some_and(|entry| entry.content.trim().is_empty())
        {
            self.entries.remove(idx);
        }
        for message in messages.iter().filter(|message| message.is_error_agent()) {
            self.push(TranscriptEntry::from(message.clone()));
        }
    }

    /// Flips a single tool or thought entry. Returns whether anything changed.
    pub fn toggle_entry(&mut self, index: usize) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.is_collapsible() => {
                entry.collapsed = !entry.collapsed;
                true
            }
            _ => false,
        }
    }

    /// Folds every tool and thought entry while any is open, otherwise opens
    /// them all.
    pub fn toggle_all_collapsed(&mut self) {
        let collapse = self
            .entries
            .iter()
            .any(|entry| entry.is_collapsible() && !entry.collapsed);
        for entry in self.entries.iter_mut().filter(|entry| entry.is_collapsible()) {
            entry.collapsed = collapse;
        }
    }

    pub fn fail(&mut self, error: &str) {
        self.finalize(&[]);
        self.push(TranscriptEntry::agent_error(format!("Error: {error}")));
    }

    fn enforce_cap(&mut self) {
        if self.entries.len() <= self.cap {
            return;
        }
        let excess = self.entries.len() - self.cap;
        self.entries.drain(..excess);
        self.streaming = self.streaming.and_then(|idx| idx.checked_sub(excess));
    }
}
