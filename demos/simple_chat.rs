//! One chat completion, no tools.
//!
//! Run with: cargo run --example simple_chat

use std::sync::Arc;
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
    let broker = LlmBroker::new(platform.default_model(), gateway);

    let messages = vec![
        LlmMessage::system("You are a helpful assistant."),
        LlmMessage::user("用一句话介绍一下Rust语言"),
    ];

    let response = broker.generate(&messages, None, None).await?;
    println!("{}", response);

    Ok(())
}
