//! Interactive chat session with bounded history.
//!
//! Each call to [`ChatSession::send`] runs one exchange through the broker.
//! The conversation for that exchange is seeded from the system prompt and
//! the last few completed exchanges; tool traffic is not carried forward.

use crate::error::Result;
use crate::llm::broker::LlmBroker;
use crate::llm::conversation::{ChatHistory, Conversation};
use crate::llm::gateway::CompletionConfig;
use crate::llm::tools::ToolRegistry;
use tracing::debug;

/// A chat session that folds a bounded history into every exchange.
///
/// # Examples
///
/// ```ignore
/// use tool_dispatch::config::{AppConfig, Platform};
/// use tool_dispatch::llm::{ChatSession, LlmBroker};
/// use tool_dispatch::llm::gateways::OpenAIGateway;
/// use std::sync::Arc;
///
/// let config = AppConfig::from_env()?;
/// let gateway = Arc::new(OpenAIGateway::for_platform(&config, Platform::OpenAi)?);
/// let broker = LlmBroker::new("gpt-4o-mini", gateway);
/// let mut session = ChatSession::builder(broker)
///     .system_prompt("You are a weather assistant.")
///     .build();
///
/// let answer = session.send("北京今天天气怎么样?").await?;
/// ```
pub struct ChatSession {
    broker: LlmBroker,
    system_prompt: String,
    tools: Option<ToolRegistry>,
    history: ChatHistory,
    config: CompletionConfig,
}

impl ChatSession {
    /// Create a new chat session with default settings.
    pub fn new(broker: LlmBroker) -> Self {
        Self::builder(broker).build()
    }

    pub fn builder(broker: LlmBroker) -> ChatSessionBuilder {
        ChatSessionBuilder::new(broker)
    }

    /// Send a message and return the model's final answer.
    ///
    /// The exchange is added to the history only when it succeeds; a failed
    /// exchange leaves the session as it was.
    pub async fn send(&mut self, query: &str) -> Result<String> {
        let conversation = Conversation::seeded(&self.system_prompt, &self.history, query);
        debug!(history = self.history.len(), "Starting exchange");

        let exchange = self.broker.run(conversation, self.tools.as_ref(), &self.config).await?;

        self.history.record(query, exchange.content.clone());
        Ok(exchange.content)
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Forget all previous exchanges
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> Option<&ToolRegistry> {
        self.tools.as_ref()
    }
}

/// Builder for constructing a `ChatSession` with custom configuration.
pub struct ChatSessionBuilder {
    broker: LlmBroker,
    system_prompt: String,
    tools: Option<ToolRegistry>,
    history_limit: usize,
    temperature: Option<f32>,
}

impl ChatSessionBuilder {
    fn new(broker: LlmBroker) -> Self {
        Self {
            broker,
            system_prompt: "You are a helpful assistant.".to_string(),
            tools: None,
            history_limit: ChatHistory::default().limit(),
            temperature: None,
        }
    }

    /// Set the system prompt (default: "You are a helpful assistant.")
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the tools the model may call
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Number of past exchanges to keep (default: 3)
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Sampling temperature, clamped to 0.0..=1.0
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 1.0));
        self
    }

    pub fn build(self) -> ChatSession {
        ChatSession {
            broker: self.broker,
            system_prompt: self.system_prompt,
            tools: self.tools.filter(|tools| !tools.is_empty()),
            history: ChatHistory::new(self.history_limit),
            config: CompletionConfig {
                temperature: self.temperature,
                ..Default::default()
            },
        }
    }
}
