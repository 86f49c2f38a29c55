use crate::error::Result;
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;

/// Configuration for LLM completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionConfig {
    /// Sampling temperature, 0.0 to 1.0; the endpoint default when unset
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature.clamp(0.0, 1.0)),
            ..Default::default()
        }
    }
}

/// Abstract interface for chat-completion providers
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send the conversation and advertised tools, returning the model's reply.
    ///
    /// Network and endpoint failures are returned as errors; no retry is made.
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse>;
}
