//! Adapter between the transcript model and the OpenAI chat-completion wire format.

use crate::error::{DispatchError, Result};
use crate::llm::models::{LlmMessage, LlmToolCall, MessageRole};
use serde_json::{json, Value};
use tracing::warn;

/// Adapt LLM messages to OpenAI format.
///
/// Every message is checked first; a transcript that breaks the tool-call
/// invariants is never sent.
pub fn adapt_messages_to_openai(messages: &[LlmMessage]) -> Result<Vec<Value>> {
    let mut result = Vec::with_capacity(messages.len());

    for msg in messages {
        msg.validate().map_err(DispatchError::InvalidMessage)?;

        let openai_msg = match msg.role {
            MessageRole::System => json!({
                "role": "system",
                "content": msg.content.as_deref().unwrap_or("")
            }),
            MessageRole::User => json!({
                "role": "user",
                "content": msg.content.as_deref().unwrap_or("")
            }),
            MessageRole::Assistant => {
                let mut assistant_msg = json!({
                    "role": "assistant",
                    "content": msg.content
                });

                if let Some(ref tool_calls) = msg.tool_calls {
                    let formatted_calls: Vec<Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments
                                }
                            })
                        })
                        .collect();
                    assistant_msg["tool_calls"] = json!(formatted_calls);
                }

                assistant_msg
            }
            MessageRole::Tool => json!({
                "role": "tool",
                "content": msg.content.as_deref().unwrap_or(""),
                "tool_call_id": msg.tool_call_id
            }),
        };

        result.push(openai_msg);
    }

    Ok(result)
}

/// Convert tool calls from OpenAI format to internal format.
///
/// Arguments stay as raw text. A call without a function name cannot be
/// answered, so it fails the whole response; calls without an id get a
/// generated one so their results can still be paired with them.
pub fn convert_tool_calls(tool_calls: &[Value]) -> Result<Vec<LlmToolCall>> {
    tool_calls
        .iter()
        .map(|tc| {
            let name = tc["function"]["name"].as_str().ok_or_else(|| {
                DispatchError::GatewayError(format!("tool call without a function name: {}", tc))
            })?;
            let id = tc["id"]
                .as_str()
                .filter(|id| !id.is_empty())
                .map(String::from)
                .unwrap_or_else(|| {
                    let generated = format!("call_{}", uuid::Uuid::new_v4().simple());
                    warn!(tool = %name, id = %generated, "Tool call without id, generated one");
                    generated
                });
            let arguments = match &tc["function"]["arguments"] {
                Value::String(raw) => raw.clone(),
                Value::Null => String::new(),
                // Some compatible endpoints send the arguments as an object
                other => other.to_string(),
            };

            Ok(LlmToolCall::new(id, name, arguments))
        })
        .collect()
}
