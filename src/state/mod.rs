use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::errors::RagError;
use crate::llm::{EmbeddingProvider, LlmProvider, OllamaProvider};
use crate::logs::{LogEntry, LogStore};
use crate::rag::{IndexReport, RagService};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Holds the resolved configuration, the session's uploaded dataset and the
/// RAG service built over it.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub logs: LogStore,
    pub rag: Arc<RagService>,
    /// Held across index rebuild and log store replacement so both always
    /// describe the same upload.
    ingest_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Loads configuration and connects the Ollama provider for both
    /// embeddings and completions.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone()).load()?;

        let ollama = Arc::new(OllamaProvider::new(&config.ollama).map_err(InitializationError::Llm)?);
        tracing::debug!(
            model = ollama.model(),
            embedding_model = ollama.embedding_model(),
            "Ollama provider configured"
        );

        let embedder: Arc<dyn EmbeddingProvider> = ollama.clone();
        let llm: Arc<dyn LlmProvider> = ollama;

        Ok(Arc::new(Self::with_providers(paths, config, embedder, llm)))
    }

    pub fn with_providers(
        paths: Arc<AppPaths>,
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let rag = Arc::new(RagService::new(embedder, llm, config.rag.clone()));
        Self {
            paths,
            config,
            logs: LogStore::new(),
            rag,
            ingest_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the session dataset. Concurrent calls run one at a time, in
    /// arrival order, so the last upload wins for both the index and the log
    /// store. If indexing fails neither is changed.
    pub async fn ingest(&self, entries: Vec<LogEntry>) -> Result<IndexReport, RagError> {
        let _guard = self.ingest_lock.lock().await;
        let report = self.rag.index_logs(&entries).await?;
        self.logs.replace(entries).await;
        Ok(report)
    }
}
