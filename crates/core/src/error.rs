//! Error types for GreenGuide.
//!
//! This module defines a unified error enum that covers configuration, I/O,
//! capability (LLM, embedding, search) and pipeline-stage failures.

use std::fmt;
use thiserror::Error;

/// Pipeline stage that issued a failing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingestion,
    Retrieval,
    Grading,
    ImageSummary,
    Rewrite,
    Generation,
    Search,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Retrieval => "retrieval",
            Self::Grading => "grading",
            Self::ImageSummary => "image-summary",
            Self::Rewrite => "rewrite",
            Self::Generation => "generation",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for GreenGuide.
///
/// All functions in the application return `Result<T, AppError>`.
/// Library code never panics; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chat/generation or embedding provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base and index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A source document could not be read or parsed
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// Embedding or index lookup failed for a question
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The grader output could not be classified
    #[error("Grading failed: {0}")]
    Grading(String),

    /// The vision call for a supplied image failed
    #[error("Image summary failed: {0}")]
    ImageSummary(String),

    /// The query rewrite call failed
    #[error("Query rewrite failed: {0}")]
    Rewrite(String),

    /// The grounded answer call failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The web search or its synthesis call failed
    #[error("Web search failed: {0}")]
    Search(String),

    /// No domain is registered under the requested id
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// A run exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// The pipeline stage this error belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Ingestion(_) => Some(Stage::Ingestion),
            Self::Retrieval(_) => Some(Stage::Retrieval),
            Self::Grading(_) => Some(Stage::Grading),
            Self::ImageSummary(_) => Some(Stage::ImageSummary),
            Self::Rewrite(_) => Some(Stage::Rewrite),
            Self::Generation(_) => Some(Stage::Generation),
            Self::Search(_) => Some(Stage::Search),
            _ => None,
        }
    }

    /// Re-tag this error as a failure of `stage`.
    ///
    /// Errors that already carry a stage keep it.
    pub fn in_stage(self, stage: Stage) -> Self {
        if self.stage().is_some() {
            return self;
        }

        let message = self.to_string();
        match stage {
            Stage::Ingestion => Self::Ingestion(message),
            Stage::Retrieval => Self::Retrieval(message),
            Stage::Grading => Self::Grading(message),
            Stage::ImageSummary => Self::ImageSummary(message),
            Stage::Rewrite => Self::Rewrite(message),
            Stage::Generation => Self::Generation(message),
            Stage::Search => Self::Search(message),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
