use crate::error::{DispatchError, Result};
use crate::llm::tools::schema::validate_descriptor;
use crate::llm::tools::tool::{LlmTool, ToolDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    tool: Arc<dyn LlmTool>,
}

/// Name-keyed table of the tools the model may call.
///
/// Built once at startup and only read while a conversation is dispatched.
/// Descriptors are captured at registration time, so a tool's advertised
/// schema cannot drift from the one it was validated against.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name.
    ///
    /// Fails if the name is already taken or the parameter schema is invalid.
    pub fn register(&mut self, tool: impl LlmTool + 'static) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool instance
    pub fn register_arc(&mut self, tool: Arc<dyn LlmTool>) -> Result<()> {
        let descriptor = tool.descriptor();
        validate_descriptor(&descriptor)?;

        let name = descriptor.name().to_string();
        if self.index.contains_key(&name) {
            return Err(DispatchError::DuplicateCapability(name));
        }

        debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool { descriptor, tool });
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, tool: impl LlmTool + 'static) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn LlmTool>> {
        self.entry(name).map(|entry| &entry.tool)
    }

    /// Descriptor a tool was registered with
    pub fn descriptor(&self, name: &str) -> Result<&ToolDescriptor> {
        self.entry(name).map(|entry| &entry.descriptor)
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|entry| entry.descriptor.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|entry| entry.descriptor.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn entry(&self, name: &str) -> Result<&RegisteredTool> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| DispatchError::UnknownCapability(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::tool::{ToolArguments, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct MockTool {
        name: &'static str,
        parameters: Value,
    }

    impl MockTool {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                parameters: json!({"type": "object", "properties": {}}),
            }
        }
    }

    #[async_trait]
    impl LlmTool for MockTool {
        async fn run(&self, _args: &ToolArguments) -> Result<ToolOutput> {
            Ok(json!(self.name).into())
        }

        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::function(self.name, "A mock tool", self.parameters.clone())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(MockTool::named("search")).unwrap();

        assert!(registry.contains("search"));
        assert!(registry.resolve("search").unwrap().matches("search"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_duplicate_name_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(MockTool::named("search")).unwrap();

        let err = registry.register(MockTool::named("search")).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateCapability(name) if name == "search"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("huiju_search").err().unwrap();
        assert!(matches!(err, DispatchError::UnknownCapability(name) if name == "huiju_search"));
    }

    #[test]
    fn test_register_invalid_schema_fails() {
        let mut registry = ToolRegistry::new();
        let tool = MockTool {
            name: "broken",
            parameters: json!({"type": "object", "required": ["missing"]}),
        };

        let err = registry.register(tool).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidSchema { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptors_keep_registration_order() {
        let registry = ToolRegistry::new()
            .with(MockTool::named("multiply"))
            .and_then(|r| r.with(MockTool::named("add")))
            .and_then(|r| r.with(MockTool::named("divide")))
            .unwrap();

        let names: Vec<_> = registry.descriptors().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["multiply", "add", "divide"]);
        assert_eq!(registry.names(), vec!["multiply", "add", "divide"]);
    }

    #[test]
    fn test_descriptor_lookup() {
        let registry = ToolRegistry::new().with(MockTool::named("add")).unwrap();
        assert_eq!(registry.descriptor("add").unwrap().function.description, "A mock tool");
        assert!(registry.descriptor("sub").is_err());
    }
}
