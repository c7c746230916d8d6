//! Prompt system for GreenGuide.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in library covering every LLM call of the answering pipeline
//! - Workspace overrides under `.greenguide/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use library::{ids, PromptLibrary};
pub use loader::{list_prompts, load_prompt, parse_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
