//! Conversation state for a single exchange, plus the bounded history a chat
//! session carries between exchanges.

use crate::error::{DispatchError, Result};
use crate::llm::models::{LlmMessage, LlmToolCall, MessageRole};
use std::collections::VecDeque;

/// Ordered, append-only transcript of one exchange with the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<LlmMessage>,
}

impl Conversation {
    /// Start a conversation with a system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![LlmMessage::system(system_prompt)],
        }
    }

    /// Start a conversation from existing messages, checking each one.
    pub fn from_messages(messages: Vec<LlmMessage>) -> Result<Self> {
        let mut conversation = Self::default();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    /// Seed a conversation the way a chat session does: system prompt, prior
    /// exchanges from `history`, then the new user message.
    pub fn seeded(
        system_prompt: impl Into<String>,
        history: &ChatHistory,
        user_message: impl Into<String>,
    ) -> Self {
        let mut conversation = Self::new(system_prompt);
        for (user, assistant) in history.exchanges() {
            conversation.messages.push(LlmMessage::user(user.clone()));
            conversation.messages.push(LlmMessage::assistant(assistant.clone()));
        }
        conversation.messages.push(LlmMessage::user(user_message));
        conversation
    }

    /// Append a message after checking its invariants.
    ///
    /// Tool results must answer a call issued by an earlier assistant message.
    pub fn push(&mut self, message: LlmMessage) -> Result<()> {
        message.validate().map_err(DispatchError::InvalidMessage)?;

        if message.role == MessageRole::Tool {
            let id = message.tool_call_id.as_deref().unwrap_or_default();
            if !self.has_pending_call(id) {
                return Err(DispatchError::InvalidMessage(format!(
                    "tool result '{}' does not answer any requested tool call",
                    id
                )));
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(LlmMessage::user(content));
    }

    /// Record the assistant turn that requested `tool_calls`
    pub fn push_tool_calls(&mut self, content: Option<String>, tool_calls: Vec<LlmToolCall>) {
        self.messages.push(LlmMessage::assistant_tool_calls(content, tool_calls));
    }

    /// Record a tool result for the call with `tool_call_id`
    pub fn push_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        self.push(LlmMessage::tool_result(tool_call_id, content))
    }

    pub fn messages(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<LlmMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of tool results recorded so far
    pub fn tool_result_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == MessageRole::Tool).count()
    }

    fn has_pending_call(&self, id: &str) -> bool {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.tool_calls.as_ref())
            .is_some_and(|calls| calls.iter().any(|c| c.id == id))
    }
}

/// Bounded history of completed (user, assistant) exchanges.
///
/// Only the final answers are kept; tool traffic from an exchange is dropped
/// when it is folded into the history.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    exchanges: VecDeque<(String, String)>,
    limit: usize,
}

impl ChatHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            exchanges: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Record a completed exchange, evicting the oldest past the limit
    pub fn record(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.limit == 0 {
            return;
        }
        if self.exchanges.len() == self.limit {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back((user.into(), assistant.into()));
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &(String, String)> {
        self.exchanges.iter()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_with_system_prompt() {
        let conversation = Conversation::new("You are a weather assistant");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, MessageRole::System);
    }

    #[test]
    fn test_seeded_folds_history_in_order() {
        let mut history = ChatHistory::new(3);
        history.record("q1", "a1");
        history.record("q2", "a2");

        let conversation = Conversation::seeded("system", &history, "q3");
        let contents: Vec<_> =
            conversation.messages().iter().map(|m| m.content.clone().unwrap()).collect();

        assert_eq!(contents, vec!["system", "q1", "a1", "q2", "a2", "q3"]);
        assert_eq!(conversation.messages()[2].role, MessageRole::Assistant);
        assert_eq!(conversation.messages()[5].role, MessageRole::User);
    }

    #[test]
    fn test_tool_result_must_answer_a_call() {
        let mut conversation = Conversation::new("system");
        conversation.push_user("2 times 3");

        let orphan = conversation.push_tool_result("call_9", "6");
        assert!(matches!(orphan, Err(DispatchError::InvalidMessage(_))));

        conversation
            .push_tool_calls(None, vec![LlmToolCall::new("call_1", "multiply", "{}")]);
        conversation.push_tool_result("call_1", "6").unwrap();
        assert_eq!(conversation.tool_result_count(), 1);
    }

    #[test]
    fn test_from_messages_rejects_invalid_message() {
        let bad = LlmMessage {
            role: MessageRole::Tool,
            content: Some("x".to_string()),
            tool_calls: None,
            tool_call_id: None,
        };
        let result = Conversation::from_messages(vec![LlmMessage::user("hi"), bad]);
        assert!(result.is_err());
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = ChatHistory::new(2);
        history.record("q1", "a1");
        history.record("q2", "a2");
        history.record("q3", "a3");

        let users: Vec<_> = history.exchanges().map(|(u, _)| u.as_str()).collect();
        assert_eq!(users, vec!["q2", "q3"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_with_zero_limit_keeps_nothing() {
        let mut history = ChatHistory::new(0);
        history.record("q1", "a1");
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_default_limit() {
        assert_eq!(ChatHistory::default().limit(), 3);
    }
}
