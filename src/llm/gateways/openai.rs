//! OpenAI-compatible chat-completion gateway.
//!
//! Works against any endpoint that speaks the `/chat/completions` dialect
//! with bearer-token auth (OpenAI, Zhipu GLM, OpenAI proxies).

use crate::config::{AppConfig, Endpoint, Platform};
use crate::error::{DispatchError, Result};
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::gateways::openai_messages_adapter::{adapt_messages_to_openai, convert_tool_calls};
use crate::llm::models::{LlmGatewayResponse, LlmMessage};
use crate::llm::tools::ToolDescriptor;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn from_endpoint(endpoint: &Endpoint, timeout: Duration) -> Self {
        Self {
            api_key: endpoint.api_key.clone(),
            base_url: endpoint.base_url.clone(),
            timeout,
        }
    }
}

/// Gateway for OpenAI-compatible chat completions with tool calling.
pub struct OpenAIGateway {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIGateway {
    /// Create a new gateway with custom configuration.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create gateway with custom API key and base URL.
    pub fn with_api_key_and_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(OpenAIConfig {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Gateway for one of the configured chat platforms
    pub fn for_platform(config: &AppConfig, platform: Platform) -> Result<Self> {
        let endpoint = config.platform(platform);
        if !endpoint.has_api_key() {
            return Err(DispatchError::ConfigError(format!(
                "no API key configured for {:?}",
                platform
            )));
        }
        Self::with_config(OpenAIConfig::from_endpoint(endpoint, config.request_timeout))
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<Value> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": adapt_messages_to_openai(messages)?,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
            body["tool_choice"] = serde_json::json!("auto");
        }
        if let Some(temperature) = config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        Ok(body)
    }
}

/// Pull the first choice's message out of a completion response body.
fn parse_completion(response_body: &Value) -> Result<LlmGatewayResponse> {
    let message = &response_body["choices"][0]["message"];
    if !message.is_object() {
        return Err(DispatchError::GatewayError(format!(
            "response has no choices[0].message: {}",
            response_body
        )));
    }

    let content = message["content"].as_str().map(String::from);
    let tool_calls = match message["tool_calls"].as_array() {
        Some(calls) => convert_tool_calls(calls)?,
        None => vec![],
    };

    Ok(LlmGatewayResponse {
        content,
        tool_calls,
    })
}

#[async_trait]
impl LlmGateway for OpenAIGateway {
    async fn complete(
        &self,
        model: &str,
        messages: &[LlmMessage],
        tools: &[ToolDescriptor],
        config: &CompletionConfig,
    ) -> Result<LlmGatewayResponse> {
        info!(model = model, "Requesting chat completion");
        debug!("Message count: {}, tool count: {}", messages.len(), tools.len());

        let body = self.build_body(model, messages, tools, config)?;

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DispatchError::GatewayError(format!(
                "chat completion failed: {} - {}",
                status, error_text
            )));
        }

        let response_body: Value = response.json().await?;
        parse_completion(&response_body)
    }
}
