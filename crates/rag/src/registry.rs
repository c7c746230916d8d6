//! Process-wide registry of domain contexts.

use crate::domain::{Domain, DomainContext, DomainId, Services, WorkflowSettings};
use crate::workflow::{self, RunOutcome};
use greenguide_core::{AppConfig, AppError, AppResult};
use greenguide_knowledge::{
    self as knowledge, create_provider, BuildOptions, BuildStats, EmbeddingConfig,
    EmbeddingProvider, IndexStats, MemoryIndex, Retriever, VectorIndex,
};
use greenguide_llm::{create_client, ImageData};
use greenguide_prompt::PromptLibrary;
use greenguide_search::create_search;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct Entry {
    domain: Domain,
    context: Option<Arc<DomainContext>>,
}

/// Owns one [`DomainContext`] per configured domain for the life of the process.
///
/// Indexes are built or opened at startup through `&mut self`; afterwards
/// runs only borrow the registry immutably.
pub struct DomainRegistry {
    workspace: PathBuf,
    entries: BTreeMap<DomainId, Entry>,
    embedder: Arc<dyn EmbeddingProvider>,
    services: Services,
    build_options: BuildOptions,
    top_k: usize,
}

impl DomainRegistry {
    /// Build the registry and its capabilities from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let llm_key = config.llm_api_key();
        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            llm_key.as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;

        let embedding_key = config.embedding_api_key();
        let embedder = create_provider(
            &EmbeddingConfig::from(&config.embedding),
            embedding_key.as_deref(),
        )?;

        let search = match config.search_api_key() {
            Some(key) => Some(create_search(
                &config.search.provider,
                config.search.endpoint.as_deref(),
                Some(&key),
                Duration::from_secs(config.search.timeout_secs),
            )?),
            None => {
                tracing::warn!(
                    "{} is not set; questions that need web search will fail",
                    config.search.api_key_env
                );
                None
            }
        };

        let services = Services {
            llm,
            search,
            prompts: Arc::new(PromptLibrary::load(&config.workspace)?),
            settings: Arc::new(WorkflowSettings::from_config(config)),
        };

        Ok(Self::with_services(config, services, embedder))
    }

    /// Build the registry around already constructed capabilities.
    pub fn with_services(
        config: &AppConfig,
        services: Services,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let entries = config
            .domains
            .iter()
            .map(|d| {
                let id = DomainId(d.id);
                let domain = Domain {
                    id,
                    label: d.label.clone(),
                    documents: d.documents_path(&config.workspace),
                };
                (id, Entry { domain, context: None })
            })
            .collect();

        Self {
            workspace: config.workspace.clone(),
            entries,
            embedder,
            services,
            build_options: BuildOptions {
                chunk_size: config.retrieval.chunk_size,
                chunk_overlap: config.retrieval.chunk_overlap,
                batch_size: config.embedding.batch_size,
            },
            top_k: config.retrieval.top_k,
        }
    }

    /// Configured domains, ordered by id.
    pub fn domains(&self) -> Vec<&Domain> {
        self.entries.values().map(|e| &e.domain).collect()
    }

    pub fn domain(&self, id: DomainId) -> AppResult<&Domain> {
        self.entry(id).map(|e| &e.domain)
    }

    /// Whether the domain's index is loaded and ready for runs.
    pub fn is_ready(&self, id: DomainId) -> bool {
        self.entries
            .get(&id)
            .map(|e| e.context.is_some())
            .unwrap_or(false)
    }

    /// Build (or rebuild) a domain's index from `folder` and make it live.
    pub async fn ingest(&mut self, id: DomainId, folder: &Path) -> AppResult<BuildStats> {
        self.entry(id)?;

        let (index, stats) = knowledge::build_index(
            &self.workspace,
            id.0,
            folder,
            self.embedder.as_ref(),
            self.build_options,
        )
        .await?;

        self.install(id, index)?;
        Ok(stats)
    }

    /// Reopen the domain's index if built, otherwise ingest its document folder.
    pub async fn open_or_ingest(&mut self, id: DomainId) -> AppResult<()> {
        let documents = self.entry(id)?.domain.documents.clone();

        if knowledge::index_exists(&self.workspace, id.0) {
            let index = knowledge::open_index(&self.workspace, id.0, self.embedder.as_ref())?;
            tracing::info!("Opened index for domain {} ({} chunks)", id, index.len());
            self.install(id, index)
        } else {
            self.ingest(id, &documents).await.map(|_| ())
        }
    }

    /// [`open_or_ingest`](Self::open_or_ingest) for every configured domain.
    pub async fn open_or_ingest_all(&mut self) -> AppResult<()> {
        let ids: Vec<DomainId> = self.entries.keys().copied().collect();
        for id in ids {
            self.open_or_ingest(id).await?;
        }
        Ok(())
    }

    /// The live context for a domain.
    pub fn context(&self, id: DomainId) -> AppResult<Arc<DomainContext>> {
        self.entry(id)?.context.clone().ok_or_else(|| {
            AppError::Knowledge(format!("Domain {} has no index; run ingest first", id))
        })
    }

    /// Answer a question within a domain.
    pub async fn run(
        &self,
        id: DomainId,
        question: &str,
        image: Option<ImageData>,
    ) -> AppResult<String> {
        self.run_traced(id, question, image)
            .await
            .map(|outcome| outcome.response)
    }

    pub async fn run_traced(
        &self,
        id: DomainId,
        question: &str,
        image: Option<ImageData>,
    ) -> AppResult<RunOutcome> {
        if question.trim().is_empty() {
            return Err(AppError::Other("Question must not be empty".to_string()));
        }

        let ctx = self.context(id)?;
        workflow::run_traced(&ctx, question, image).await
    }

    /// Ask the domain for suggestions about `topic`.
    pub async fn suggest(&self, id: DomainId, topic: &str) -> AppResult<RunOutcome> {
        if topic.trim().is_empty() {
            return Err(AppError::Other("Topic must not be empty".to_string()));
        }

        let question = format!("give suggestions about '{}'", topic.trim());
        self.run_traced(id, &question, None).await
    }

    /// Index statistics for a built domain.
    pub fn stats(&self, id: DomainId) -> AppResult<IndexStats> {
        self.entry(id)?;
        knowledge::stats(&self.workspace, id.0)
    }

    fn entry(&self, id: DomainId) -> AppResult<&Entry> {
        self.entries
            .get(&id)
            .ok_or_else(|| AppError::UnknownDomain(id.to_string()))
    }

    fn install(&mut self, id: DomainId, index: MemoryIndex) -> AppResult<()> {
        let retriever = Retriever::new(Arc::new(index), self.embedder.clone(), self.top_k);
        let services = self.services.clone();
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| AppError::UnknownDomain(id.to_string()))?;

        entry.context = Some(Arc::new(DomainContext::new(
            entry.domain.clone(),
            retriever,
            services,
        )));
        Ok(())
    }
}
