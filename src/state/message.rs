#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Agent,
    Tool,
    Thought,
    /// A streamed slice of the answer. Only exists while a turn is in flight.
    TextFragment,
}

/// A transcript entry produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub content: String,
    pub is_error: bool,
}

impl Message {
    fn new(kind: MessageKind, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            kind,
            content: content.into(),
            is_error,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, content, false)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Agent, content, false)
    }

    pub fn agent_error(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Agent, content, true)
    }

    pub fn tool(content: impl Into<String>, is_error: bool) -> Self {
        Self::new(MessageKind::Tool, content, is_error)
    }

    pub fn thought(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Thought, content, false)
    }

    pub fn fragment(content: impl Into<String>) -> Self {
        Self::new(MessageKind::TextFragment, content, false)
    }

    /// Closes a streamed fragment into the turn's Agent message.
    pub fn into_agent(self) -> Self {
        Self {
            kind: MessageKind::Agent,
            ..self
        }
    }

    pub fn is_error_agent(&self) -> bool {
        self.kind == MessageKind::Agent && self.is_error
    }
}

/// Running token totals. Counters only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn record_input(&mut self, tokens: u64) {
        self.input = self.input.saturating_add(tokens);
        self.total = self.total.saturating_add(tokens);
    }

    pub fn record_output(&mut self, tokens: u64) {
        self.output = self.output.saturating_add(tokens);
        self.total = self.total.saturating_add(tokens);
    }
}
