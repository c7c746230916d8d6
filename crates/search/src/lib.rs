//! Web search integration for GreenGuide.
//!
//! Provides the `WebSearch` capability used when a question is relevant to a
//! domain but the local corpus cannot answer it.
//!
//! # Providers
//! - **Tavily**: Search API tuned for LLM consumption (default)

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{format_hits, SearchHit, WebSearch};
pub use factory::create_search;
pub use providers::TavilyClient;
