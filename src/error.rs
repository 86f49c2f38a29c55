//! Error types and result aliases for the dispatch library.
//!
//! Errors that a capability can describe to the model travel as
//! [`ToolOutput::Error`](crate::llm::tools::ToolOutput) payloads instead.
//! Everything in [`DispatchError`] either terminates the current exchange
//! or is caught at the dispatch boundary and turned into such a payload.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("LLM gateway error: {0}")]
    GatewayError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unexpected upstream response: {0}")]
    UpstreamFormat(String),

    #[error("Malformed arguments for tool '{tool}': {message}")]
    ArgumentParse { tool: String, message: String },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("Invalid parameter schema for tool '{tool}': {message}")]
    InvalidSchema { tool: String, message: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Tool loop exceeded {0} round-trips without a final answer")]
    LoopBudgetExceeded(usize),

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
