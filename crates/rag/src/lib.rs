//! GreenGuide question-answering workflow.
//!
//! Grades how well a domain's documents answer a question and routes it to
//! grounded generation, web search, or a refusal.

mod completion;
pub mod domain;
pub mod generator;
pub mod grader;
pub mod language;
pub mod refusal;
pub mod registry;
pub mod rewriter;
pub mod search_agent;
pub mod state;
pub mod summarizer;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{Domain, DomainContext, DomainId, Services, WorkflowSettings};
pub use registry::DomainRegistry;
pub use state::{Node, RelevanceGrade, RequestState};
pub use workflow::{run, run_traced, RunOutcome};
