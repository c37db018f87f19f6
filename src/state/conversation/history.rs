use crate::types::{Content, Part, ROLE_MODEL, ROLE_USER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    User,
    Model,
    /// Outputs of the tool calls requested by the preceding model block.
    ToolResult,
}

impl BlockRole {
    /// Function responses travel under the user role on the wire.
    fn wire_role(self) -> &'static str {
        match self {
            BlockRole::User | BlockRole::ToolResult => ROLE_USER,
            BlockRole::Model => ROLE_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationBlock {
    pub role: BlockRole,
    pub parts: Vec<Part>,
}

impl ConversationBlock {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: BlockRole::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: BlockRole::Model,
            parts,
        }
    }

    pub fn tool_results(parts: Vec<Part>) -> Self {
        Self {
            role: BlockRole::ToolResult,
            parts,
        }
    }

    pub fn to_content(&self) -> Content {
        Content {
            role: self.role.wire_role().to_string(),
            parts: self.parts.clone(),
        }
    }
}

/// Append-only block history sent with every model call.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    blocks: Vec<ConversationBlock>,
}

impl Conversation {
    pub fn push(&mut self, block: ConversationBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[ConversationBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn to_wire(&self) -> Vec<Content> {
        self.blocks.iter().map(ConversationBlock::to_content).collect()
    }
}
