use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Parsed arguments of a tool call
pub type ToolArguments = Map<String, Value>;

/// Descriptor for tool function parameters
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDescriptor {
    pub r#type: String,
    pub function: FunctionDescriptor,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Build a `"function"` descriptor
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: FunctionDescriptor {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Outcome of a tool run that the model gets to see.
///
/// `Error` is a legitimate answer (city not found, division by zero) and is
/// sent back as `{"error": ...}` so the model can react on its next turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Value(Value),
    Error(String),
}

impl ToolOutput {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// JSON form sent back to the model
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Error(message) => json!({ "error": message }),
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Trait for LLM tools
#[async_trait]
pub trait LlmTool: Send + Sync {
    /// Execute the tool with given arguments.
    ///
    /// `Err` means the tool itself failed; the broker still reports it to the
    /// model as an error payload.
    async fn run(&self, args: &ToolArguments) -> Result<ToolOutput>;

    /// Get tool descriptor for LLM
    fn descriptor(&self) -> ToolDescriptor;

    /// Check if this tool matches the given name
    fn matches(&self, name: &str) -> bool {
        self.descriptor().function.name == name
    }
}

/// Fetch a required string argument
pub(crate) fn string_arg<'a>(args: &'a ToolArguments, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_descriptor_serialization() {
        let descriptor = ToolDescriptor::function(
            "search",
            "Search the web",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"}
                },
                "required": ["query"]
            }),
        );

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "search");
        assert_eq!(json["function"]["parameters"]["required"][0], "query");
    }

    #[test]
    fn test_tool_descriptor_deserialization() {
        let json = r#"{
            "type": "function",
            "function": {
                "name": "get_weather",
                "description": "Current weather for a city",
                "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
            }
        }"#;

        let descriptor: ToolDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.r#type, "function");
        assert_eq!(descriptor.name(), "get_weather");
    }

    #[test]
    fn test_tool_output_error_payload() {
        let output = ToolOutput::error("city not found");
        assert!(output.is_error());
        assert_eq!(output.into_value(), json!({"error": "city not found"}));
    }

    #[test]
    fn test_tool_output_value_passthrough() {
        let output: ToolOutput = json!({"temperature": 21.5}).into();
        assert!(!output.is_error());
        assert_eq!(output.into_value(), json!({"temperature": 21.5}));
    }

    struct MockTool;

    #[async_trait]
    impl LlmTool for MockTool {
        async fn run(&self, _args: &ToolArguments) -> Result<ToolOutput> {
            Ok(json!("result").into())
        }

        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::function("mock_tool", "A mock tool", json!({"type": "object"}))
        }
    }

    #[test]
    fn test_tool_matches() {
        let tool = MockTool;
        assert!(tool.matches("mock_tool"));
        assert!(!tool.matches("other_tool"));
    }

    #[tokio::test]
    async fn test_tool_run() {
        let tool = MockTool;
        let result = tool.run(&ToolArguments::new()).await.unwrap();
        assert_eq!(result, ToolOutput::Value(json!("result")));
    }

    #[test]
    fn test_string_arg_trims_and_rejects_empty() {
        let mut args = ToolArguments::new();
        args.insert("city".to_string(), json!("  Beijing "));
        args.insert("blank".to_string(), json!("   "));
        args.insert("number".to_string(), json!(3));

        assert_eq!(string_arg(&args, "city"), Some("Beijing"));
        assert_eq!(string_arg(&args, "blank"), None);
        assert_eq!(string_arg(&args, "number"), None);
        assert_eq!(string_arg(&args, "missing"), None);
    }
}
