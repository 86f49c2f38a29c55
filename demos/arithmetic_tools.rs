//! Let the model evaluate an expression using the four arithmetic tools.
//!
//! Run with: cargo run --example arithmetic_tools

use std::sync::Arc;
use tool_dispatch::llm::tools::arithmetic_tools;
use tool_dispatch::llm::{Conversation, LlmMessage, MessageRole};
use tool_dispatch::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let platform = config.default_platform()?;
    let gateway = Arc::new(OpenAIGateway::for_platform(&config, platform)?);
    let broker = LlmBroker::new(platform.default_model(), gateway)
        .with_max_iterations(config.max_tool_iterations);
    let tools = arithmetic_tools()?;

    let mut conversation = Conversation::new(
        "You are a calculator. Use the tools for every operation, one step at a time.",
    );
    conversation.push_user("计算一下123.45*345.67/5+789.01-8的结果");

    let exchange = broker.run(conversation, Some(&tools), &CompletionConfig::default()).await?;

    for message in exchange.transcript.messages() {
        print_step(message);
    }
    println!("\nAnswer ({} round-trips): {}", exchange.round_trips, exchange.content);

    Ok(())
}

fn print_step(message: &LlmMessage) {
    match message.role {
        MessageRole::Assistant => {
            for call in message.tool_calls.iter().flatten() {
                println!("-> {}({})", call.name, call.arguments);
            }
        }
        MessageRole::Tool => {
            println!("<- {}", message.content.as_deref().unwrap_or_default());
        }
        _ => {}
    }
}
