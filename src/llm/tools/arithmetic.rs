//! Two-operand arithmetic tools: `add`, `subtract`, `multiply`, `divide`.

use crate::error::{DispatchError, Result};
use crate::llm::tools::schema::parameters_for;
use crate::llm::tools::tool::{LlmTool, ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Deserialize, JsonSchema)]
struct Operands {
    /// The first number
    a: f64,
    /// The second number
    b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Operation::Add => "Add two numbers (a + b)",
            Operation::Subtract => "Subtract the second number from the first (a - b)",
            Operation::Multiply => "Multiply two numbers (a * b)",
            Operation::Divide => "Divide the first number by the second (a / b); b must not be 0",
        }
    }

    /// Apply the operation; division by zero and overflow are error payloads,
    /// never a failure.
    pub fn apply(self, a: f64, b: f64) -> ToolOutput {
        let result = match self {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide if b == 0.0 => return ToolOutput::error("division by zero"),
            Operation::Divide => a / b,
        };
        if !result.is_finite() {
            return ToolOutput::error("result is not a finite number");
        }
        ToolOutput::Value(number(result))
    }
}

/// Render integral results as JSON integers so `2 * 3` reads back as `6`.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// One arithmetic operation exposed as a tool
#[derive(Debug, Clone)]
pub struct ArithmeticTool {
    operation: Operation,
    parameters: Value,
}

impl ArithmeticTool {
    pub fn new(operation: Operation) -> Result<Self> {
        Ok(Self {
            operation,
            parameters: parameters_for::<Operands>()?,
        })
    }

    /// The four arithmetic tools, in the order they are usually advertised
    pub fn all() -> Result<Vec<ArithmeticTool>> {
        [Operation::Multiply, Operation::Add, Operation::Subtract, Operation::Divide]
            .into_iter()
            .map(Self::new)
            .collect()
    }
}

#[async_trait]
impl LlmTool for ArithmeticTool {
    async fn run(&self, args: &ToolArguments) -> Result<ToolOutput> {
        let operands: Operands = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| DispatchError::ToolError(format!("{}: {}", self.operation.name(), e)))?;
        Ok(self.operation.apply(operands.a, operands.b))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            self.operation.name(),
            self.operation.description(),
            self.parameters.clone(),
        )
    }
}
