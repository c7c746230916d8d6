//! LLM integration crate for GreenGuide.
//!
//! This crate provides a provider-agnostic abstraction over chat models,
//! including vision-capable ones that accept images alongside the prompt.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Chat Completions API and compatible servers
//!
//! # Example
//! ```no_run
//! use greenguide_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Which crops suit sandy soil?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod image;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use image::ImageData;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
