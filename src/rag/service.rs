//! Session-level RAG facade: owns the current index and wires a fresh
//! pipeline for every query.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::config::RagSettings;
use crate::core::errors::RagError;
use crate::llm::{EmbeddingProvider, LlmProvider};
use crate::logs::LogEntry;

use super::generator::AnswerGenerator;
use super::grader::RelevanceGrader;
use super::index::VectorIndex;
use super::orchestrator::{AnswerResponse, Orchestrator, QueryTrace};
use super::retriever::{embed_with_timeout, Retriever};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub dimension: Option<usize>,
}

pub struct RagService {
    index: RwLock<Arc<VectorIndex>>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    settings: RagSettings,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        settings: RagSettings,
    ) -> Self {
        Self {
            index: RwLock::new(Arc::new(VectorIndex::new())),
            embedder,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub async fn indexed_count(&self) -> usize {
        self.index.read().await.len()
    }

    /// Embeds `entries` into a new index and swaps it in. On failure the
    /// previous index stays active; queries already running keep the
    /// snapshot they started with.
    pub async fn index_logs(&self, entries: &[LogEntry]) -> Result<IndexReport, RagError> {
        let limit = self.settings.embed_timeout();
        let mut index = VectorIndex::with_capacity(entries.len());

        for entry in entries {
            let vector = embed_with_timeout(self.embedder.as_ref(), &entry.embedding_text(), limit).await?;
            index.insert(entry.clone(), vector)?;
        }

        let report = IndexReport {
            indexed: index.len(),
            dimension: index.dimension(),
        };
        *self.index.write().await = Arc::new(index);

        tracing::info!(
            indexed = report.indexed,
            dimension = ?report.dimension,
            "Vector index rebuilt"
        );
        Ok(report)
    }

    pub async fn answer(&self, query: &str) -> Result<AnswerResponse, RagError> {
        self.orchestrator().await.answer(query).await
    }

    pub async fn answer_with_trace(&self, query: &str) -> Result<QueryTrace, RagError> {
        self.orchestrator().await.answer_with_trace(query).await
    }

    async fn orchestrator(&self) -> Orchestrator {
        let index = self.index.read().await.clone();
        Orchestrator::new(
            Retriever::new(self.embedder.clone(), index, self.settings.embed_timeout()),
            RelevanceGrader::new(
                self.llm.clone(),
                self.settings.grader_concurrency,
                self.settings.grade_timeout(),
            ),
            AnswerGenerator::new(self.llm.clone(), self.settings.generation_timeout()),
            self.settings.top_k,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ProviderError;
    use crate::rag::prompt::NO_EVIDENCE_ANSWER;
    use crate::rag::testing::{connection_dataset, KeywordEmbedder, ScriptedLlm};

    fn service() -> (RagService, Arc<KeywordEmbedder>, Arc<ScriptedLlm>) {
        let embedder = Arc::new(KeywordEmbedder::new());
        let llm = Arc::new(ScriptedLlm::new());
        let settings = RagSettings {
            top_k: 3,
            ..RagSettings::default()
        };
        (
            RagService::new(embedder.clone(), llm.clone(), settings),
            embedder,
            llm,
        )
    }

    #[tokio::test]
    async fn query_before_ingestion_is_empty_index() {
        let (service, _, _) = service();
        assert_eq!(service.indexed_count().await, 0);
        assert_eq!(
            service.answer("why did the connection fail?").await.unwrap_err(),
            RagError::EmptyIndex
        );
    }

    #[tokio::test]
    async fn indexing_reports_size_and_dimension() {
        let (service, embedder, _) = service();
        let report = service.index_logs(&connection_dataset()).await.expect("index");

        assert_eq!(
            report,
            IndexReport {
                indexed: 3,
                dimension: Some(4)
            }
        );
        assert_eq!(service.indexed_count().await, 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn answers_against_the_latest_index() {
        let (service, _, _) = service();
        service.index_logs(&connection_dataset()).await.expect("index");

        let response = service
            .answer("why did the connection fail?")
            .await
            .expect("answer");
        assert_eq!(response.evidence.len(), 2);

        let heartbeat_only: Vec<LogEntry> = connection_dataset()
            .into_iter()
            .filter(|e| e.message.contains("heartbeat"))
            .collect();
        service.index_logs(&heartbeat_only).await.expect("reindex");
        assert_eq!(service.indexed_count().await, 1);

        let response = service
            .answer("why did the connection fail?")
            .await
            .expect("answer");
        assert_eq!(response.text, NO_EVIDENCE_ANSWER);
        assert!(response.is_fallback());
    }

    struct FlakyEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            if text.contains("heartbeat") {
                Err(ProviderError::Status {
                    status: 500,
                    body: "model not loaded".to_string(),
                })
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    #[tokio::test]
    async fn failed_reindex_keeps_previous_index() {
        let service = RagService::new(
            Arc::new(FlakyEmbedder),
            Arc::new(ScriptedLlm::new()),
            RagSettings::default(),
        );
        let dataset = connection_dataset();
        service.index_logs(&dataset[..2]).await.expect("first index");

        let err = service.index_logs(&dataset).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingUnavailable(_)));
        assert_eq!(service.indexed_count().await, 2);
    }
}
