//! Interactive weather assistant with search, weather lookup and a short
//! memory of the last few exchanges.
//!
//! Run with: cargo run --example weather_assistant

use std::io::{self, Write};
use std::sync::Arc;
use tool_dispatch::llm::tools::assistant_tools;
use tool_dispatch::prelude::*;
use tracing_subscriber::EnvFilter;

const SYSTEM_PROMPT: &str = "You are a friendly weather assistant. Use get_weather for current \
conditions, air quality and suggestions for a city, and search for anything else that needs \
up-to-date information. Answer in the user's language.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = AppConfig::from_env()?;
    let platform = match std::env::var("CHAT_PLATFORM") {
        Ok(name) => name.parse::<Platform>()?,
        Err(_) => config.default_platform()?,
    };
    let model = platform.resolve_model(&std::env::var("CHAT_MODEL").unwrap_or_default());

    let gateway = Arc::new(OpenAIGateway::for_platform(&config, platform)?);
    let broker =
        LlmBroker::new(model, gateway).with_max_iterations(config.max_tool_iterations);

    let mut session = ChatSession::builder(broker)
        .system_prompt(SYSTEM_PROMPT)
        .tools(assistant_tools(&config)?)
        .temperature(0.7)
        .build();

    println!("Weather assistant ({:?}, {})", platform, model);
    println!("Ask about the weather anywhere. Send an empty line to exit.\n");

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut query = String::new();
        io::stdin().read_line(&mut query)?;
        let query = query.trim();
        if query.is_empty() {
            println!("Goodbye!");
            break;
        }

        match session.send(query).await {
            Ok(response) => println!("Assistant: {}\n", response),
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }

    Ok(())
}
