//! Call the search capability directly and print what it returns.
//!
//! Run with: cargo run --example search

use tool_dispatch::config::AppConfig;
use tool_dispatch::llm::tools::web_search_tool::WebSearchTool;
use tool_dispatch::llm::ToolOutput;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let tool = WebSearchTool::new(&config.search, config.request_timeout)?;

    match tool.search("北京的旅游景区有哪些?").await {
        ToolOutput::Value(value) => println!("{}", value["content"].as_str().unwrap_or_default()),
        ToolOutput::Error(message) => eprintln!("Search failed: {}", message),
    }

    Ok(())
}
