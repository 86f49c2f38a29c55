//! Tool-calling dispatch for OpenAI-compatible chat-completion endpoints.
//!
//! The [`LlmBroker`](llm::LlmBroker) sends a conversation to a gateway,
//! runs the tools the model asks for from a [`ToolRegistry`](llm::ToolRegistry),
//! feeds their results back and repeats until the model answers.

pub mod config;
pub mod error;
pub mod llm;

pub use error::{DispatchError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{AppConfig, Platform};
    pub use crate::error::{DispatchError, Result};
    pub use crate::llm::gateways::OpenAIGateway;
    pub use crate::llm::tools::{LlmTool, ToolArguments, ToolDescriptor, ToolOutput, ToolRegistry};
    pub use crate::llm::{
        ChatSession, CompletionConfig, LlmBroker, LlmGateway, LlmMessage, MessageRole,
    };
}
