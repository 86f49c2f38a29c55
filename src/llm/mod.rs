pub mod broker;
pub mod chat_session;
pub mod conversation;
pub mod gateway;
pub mod gateways;
pub mod models;
pub mod tools;

pub use broker::{Exchange, LlmBroker};
pub use chat_session::{ChatSession, ChatSessionBuilder};
pub use conversation::{ChatHistory, Conversation};
pub use gateway::{CompletionConfig, LlmGateway};
pub use models::{LlmGatewayResponse, LlmMessage, LlmToolCall, MessageRole};
pub use tools::{FunctionDescriptor, LlmTool, ToolDescriptor, ToolOutput, ToolRegistry};
