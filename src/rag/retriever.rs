use std::sync::Arc;
use std::time::Duration;

use crate::core::errors::RagError;
use crate::llm::EmbeddingProvider;

use super::index::{RetrievalCandidate, VectorIndex};

/// Embeds the query text and looks it up in a snapshot of the index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            embed_timeout,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Candidates come back in index order (best first), unchanged.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalCandidate>, RagError> {
        // Nothing to search; skip the embedding round-trip.
        if self.index.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let vector = embed_with_timeout(self.embedder.as_ref(), query, self.embed_timeout).await?;
        self.index.query(&vector, k)
    }
}

pub(crate) async fn embed_with_timeout(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    limit: Duration,
) -> Result<Vec<f32>, RagError> {
    match tokio::time::timeout(limit, embedder.embed(text)).await {
        Ok(Ok(vector)) => Ok(vector),
        Ok(Err(err)) => Err(RagError::EmbeddingUnavailable(format!(
            "{}: {}",
            embedder.name(),
            err
        ))),
        Err(_) => Err(RagError::EmbeddingUnavailable(format!(
            "{}: timed out after {:?}",
            embedder.name(),
            limit
        ))),
    }
}
