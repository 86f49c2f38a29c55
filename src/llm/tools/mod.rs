pub mod arithmetic;
pub mod exchange_rate_tool;
mod registry;
pub mod schema;
mod tool;
pub mod weather_tool;
pub mod web_search_tool;

pub use registry::ToolRegistry;
pub use tool::{FunctionDescriptor, LlmTool, ToolArguments, ToolDescriptor, ToolOutput};

use crate::config::AppConfig;
use crate::error::Result;
use arithmetic::ArithmeticTool;
use weather_tool::WeatherTool;
use web_search_tool::WebSearchTool;

/// Registry holding `multiply`, `add`, `subtract` and `divide`
pub fn arithmetic_tools() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in ArithmeticTool::all()? {
        registry.register(tool)?;
    }
    Ok(registry)
}

/// Registry for the chat assistant: `search` and `get_weather`
pub fn assistant_tools(config: &AppConfig) -> Result<ToolRegistry> {
    ToolRegistry::new()
        .with(WebSearchTool::new(&config.search, config.request_timeout)?)?
        .with(WeatherTool::new(&config.weather, config.request_timeout)?)
}
