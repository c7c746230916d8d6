//! Concrete web search providers.

pub mod tavily;

pub use tavily::TavilyClient;
