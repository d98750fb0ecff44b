//! Model Gateway
//!
//! The single `invoke` capability the decision orchestrator consumes,
//! plus one adapter per provider family:
//! - `anthropic`: Messages API
//! - `openai`: chat-completions shape (OpenAI, Azure OpenAI, DeepSeek,
//!   Qwen and other compatible endpoints via base URL)
//! - `mock`: scripted client for tests and dry runs

pub mod anthropic;
pub mod client;
pub mod mock;
pub mod openai;
pub mod registry;

pub use client::{invoke_with_retry, InvokeError, InvokeRequest, InvokeResponse, ModelClient};
pub use registry::ModelRegistry;
