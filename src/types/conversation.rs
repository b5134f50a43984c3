//! Append-only conversation log for a single run.

use super::message::{Message, OracleTurn, ToolResult};

/// Position of a message in a [`Conversation`]. Indices only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageIndex(pub usize);

/// The ordered message log of one run.
///
/// Messages can be appended and read but never edited or removed. The oracle
/// receives a borrowed snapshot (`&[Message]`) on every call, so nothing it
/// does can disturb the log.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a log with the system directive followed by the user query.
    pub fn seeded(directive: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(directive), Message::user(query)],
        }
    }

    pub fn push(&mut self, message: Message) -> MessageIndex {
        self.messages.push(message);
        MessageIndex(self.messages.len() - 1)
    }

    pub fn push_turn(&mut self, turn: OracleTurn) -> MessageIndex {
        self.push(Message::OracleTurn(turn))
    }

    pub fn push_tool_result(&mut self, result: ToolResult) -> MessageIndex {
        self.push(Message::ToolResult(result))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: MessageIndex) -> Option<&Message> {
        self.messages.get(index.0)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.messages.iter().filter_map(Message::as_tool_result)
    }
}
