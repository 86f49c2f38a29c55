//! Fetch the RMB exchange-rate table directly.
//!
//! Run with: cargo run --example exchange_rate

use tool_dispatch::config::AppConfig;
use tool_dispatch::llm::tools::exchange_rate_tool::ExchangeRateTool;
use tool_dispatch::llm::ToolOutput;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let tool = ExchangeRateTool::new(&config.exchange_rate, config.request_timeout)?;

    match tool.quote("", "").await {
        ToolOutput::Value(table) => println!("{}", serde_json::to_string_pretty(&table)?),
        ToolOutput::Error(message) => eprintln!("Exchange rate lookup failed: {}", message),
    }

    Ok(())
}
