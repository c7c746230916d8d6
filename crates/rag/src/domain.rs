//! Domains and the per-domain context shared by every run.

use greenguide_core::AppConfig;
use greenguide_knowledge::Retriever;
use greenguide_llm::LlmClient;
use greenguide_prompt::PromptLibrary;
use greenguide_search::WebSearch;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of a knowledge domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DomainId(pub u32);

impl From<u32> for DomainId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable subject-matter scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Domain {
    pub id: DomainId,

    /// Human-readable label used in prompts and refusals
    pub label: String,

    /// Folder the domain's documents are ingested from
    pub documents: PathBuf,
}

/// Run-independent settings for the workflow nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    /// Chat model for grading, rewriting, search synthesis and generation
    pub model: String,

    /// Vision-capable model for image summaries
    pub vision_model: String,

    /// Geography the assistant persona is scoped to
    pub region: String,

    /// Language used for rewrites of questions not in Arabic script
    pub default_language: String,

    pub max_search_results: usize,

    /// Deadline for a whole run
    pub run_timeout: Option<Duration>,
}

impl WorkflowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            vision_model: config.llm.vision_model().to_string(),
            region: config.assistant.region.clone(),
            default_language: config.assistant.default_language.clone(),
            max_search_results: config.search.max_results,
            run_timeout: config.assistant.run_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// External capabilities and settings shared by all domains.
#[derive(Clone)]
pub struct Services {
    pub llm: Arc<dyn LlmClient>,

    /// Absent when no search provider is configured
    pub search: Option<Arc<dyn WebSearch>>,

    pub prompts: Arc<PromptLibrary>,
    pub settings: Arc<WorkflowSettings>,
}

/// Everything a run needs for one domain.
///
/// Built once per domain and shared read-only by concurrent runs.
#[derive(Clone)]
pub struct DomainContext {
    pub domain: Domain,
    pub retriever: Retriever,
    pub services: Services,
}

impl DomainContext {
    pub fn new(domain: Domain, retriever: Retriever, services: Services) -> Self {
        Self {
            domain,
            retriever,
            services,
        }
    }

    pub fn label(&self) -> &str {
        &self.domain.label
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.services.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = AppConfig::default();
        config.llm.model = "llama3.2".to_string();
        config.llm.vision_model = Some("llava".to_string());
        config.assistant.run_timeout_secs = Some(30);

        let settings = WorkflowSettings::from_config(&config);
        assert_eq!(settings.model, "llama3.2");
        assert_eq!(settings.vision_model, "llava");
        assert_eq!(settings.region, "Jordan");
        assert_eq!(settings.max_search_results, 3);
        assert_eq!(settings.run_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_domain_id_display() {
        assert_eq!(DomainId::from(3).to_string(), "3");
    }
}
