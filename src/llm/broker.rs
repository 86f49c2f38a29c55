use crate::error::{DispatchError, Result};
use crate::llm::conversation::Conversation;
use crate::llm::gateway::{CompletionConfig, LlmGateway};
use crate::llm::models::{LlmMessage, LlmToolCall};
use crate::llm::tools::schema::check_arguments;
use crate::llm::tools::{ToolArguments, ToolOutput, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on chat-completion round-trips for one exchange
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Result of one completed exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The model's final answer
    pub content: String,
    /// Full transcript, including tool calls and their results
    pub transcript: Conversation,
    /// Number of chat-completion requests made
    pub round_trips: usize,
}

/// Drives the request / tool-execution cycle against a gateway.
///
/// Each response that requests tools has those tools run in the order the
/// model listed them, their results appended to the transcript, and the
/// transcript resent. The first response without tool calls ends the
/// exchange. Everything is awaited in sequence; one exchange never has two
/// requests or two tool runs in flight.
pub struct LlmBroker {
    model: String,
    gateway: Arc<dyn LlmGateway>,
    max_iterations: usize,
}

impl LlmBroker {
    /// Create a new LLM broker
    pub fn new(model: impl Into<String>, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            model: model.into(),
            gateway,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Cap the number of round-trips per exchange (at least one)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Generate a text response, running any tools the model asks for.
    pub async fn generate(
        &self,
        messages: &[LlmMessage],
        tools: Option<&ToolRegistry>,
        config: Option<CompletionConfig>,
    ) -> Result<String> {
        let conversation = Conversation::from_messages(messages.to_vec())?;
        let exchange = self.run(conversation, tools, &config.unwrap_or_default()).await?;
        Ok(exchange.content)
    }

    /// Run one exchange to completion and return the final answer with its transcript.
    pub async fn run(
        &self,
        mut conversation: Conversation,
        tools: Option<&ToolRegistry>,
        config: &CompletionConfig,
    ) -> Result<Exchange> {
        let descriptors = tools.map(ToolRegistry::descriptors).unwrap_or_default();
        let mut round_trips = 0;

        loop {
            round_trips += 1;
            debug!(iteration = round_trips, messages = conversation.len(), "Sending conversation");

            let response = self
                .gateway
                .complete(&self.model, conversation.messages(), &descriptors, config)
                .await?;

            if !response.has_tool_calls() {
                info!(round_trips, "Model returned final answer");
                return Ok(Exchange {
                    content: response.content.unwrap_or_default(),
                    transcript: conversation,
                    round_trips,
                });
            }

            if round_trips >= self.max_iterations {
                warn!(limit = self.max_iterations, "Tool loop budget exhausted");
                return Err(DispatchError::LoopBudgetExceeded(self.max_iterations));
            }

            let registry = match tools {
                Some(registry) => registry,
                None => {
                    return Err(DispatchError::UnknownCapability(
                        response.tool_calls[0].name.clone(),
                    ))
                }
            };

            info!("Tool calls requested: {}", response.tool_calls.len());
            conversation.push_tool_calls(response.content, response.tool_calls.clone());

            for tool_call in &response.tool_calls {
                let output = self.dispatch_tool_call(tool_call, registry).await?;
                conversation.push_tool_result(&tool_call.id, serde_json::to_string(&output)?)?;
            }
        }
    }

    /// Execute one tool call and return the JSON the model gets back.
    ///
    /// Malformed arguments and unknown tool names fail the exchange. Argument
    /// schema violations and tool failures become `{"error": ...}` payloads.
    async fn dispatch_tool_call(
        &self,
        tool_call: &LlmToolCall,
        registry: &ToolRegistry,
    ) -> Result<Value> {
        let args = parse_arguments(tool_call)?;
        let tool = registry.resolve(&tool_call.name)?;
        let descriptor = registry.descriptor(&tool_call.name)?;

        if let Err(problem) = check_arguments(descriptor, &args) {
            warn!(tool = %tool_call.name, problem = %problem, "Rejected tool arguments");
            return Ok(ToolOutput::error(problem).into_value());
        }

        info!(tool = %tool_call.name, id = %tool_call.id, "Executing tool");
        let output = match tool.run(&args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %tool_call.name, error = %e, "Tool execution failed");
                ToolOutput::error(e.to_string())
            }
        };

        if let ToolOutput::Error(ref message) = output {
            debug!(tool = %tool_call.name, error = %message, "Tool returned an error payload");
        }
        Ok(output.into_value())
    }
}

/// Parse a call's raw arguments into an argument map.
///
/// Blank arguments mean "no arguments"; anything else must be a JSON object.
fn parse_arguments(tool_call: &LlmToolCall) -> Result<ToolArguments> {
    let raw = tool_call.arguments.trim();
    if raw.is_empty() {
        return Ok(ToolArguments::new());
    }

    let parse_error = |message: String| DispatchError::ArgumentParse {
        tool: tool_call.name.clone(),
        message,
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(args)) => Ok(args),
        Ok(other) => Err(parse_error(format!("expected a JSON object, got {}", other))),
        Err(e) => Err(parse_error(e.to_string())),
    }
}
