//! In-memory vector index over embedded log entries.
//!
//! Brute-force cosine scan; ties keep insertion order so results are
//! reproducible. The first inserted vector fixes the dimension for the
//! lifetime of the index.

use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::RagError;
use crate::logs::LogEntry;
use crate::vector_math;

/// A log entry and its embedding.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedEntry {
    #[serde(flatten)]
    pub entry: LogEntry,
    #[serde(skip)]
    pub vector: Vec<f32>,
}

/// One query hit: a shared reference into the index plus its score and
/// 0-based rank.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalCandidate {
    pub entry: Arc<EmbeddedEntry>,
    pub score: f32,
    pub rank: usize,
}

impl RetrievalCandidate {
    pub fn log(&self) -> &LogEntry {
        &self.entry.entry
    }
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    entries: Vec<Arc<EmbeddedEntry>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dimension: None,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` until the first insert.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn insert(&mut self, entry: LogEntry, vector: Vec<f32>) -> Result<(), RagError> {
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }

        self.entries.push(Arc::new(EmbeddedEntry { entry, vector }));
        Ok(())
    }

    /// Returns the `k` entries most similar to `vector`, best first.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievalCandidate>, RagError> {
        let Some(expected) = self.dimension.filter(|_| !self.entries.is_empty()) else {
            return Err(RagError::EmptyIndex);
        };
        if k == 0 {
            return Err(RagError::InvalidK(k));
        }
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, stored)| (idx, vector_math::cosine_similarity(vector, &stored.vector)))
            .collect();

        // Scores are finite (non-finite similarity maps to 0), and
        // `total_cmp` keeps the order total regardless.
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (idx, score))| RetrievalCandidate {
                entry: Arc::clone(&self.entries[idx]),
                score,
                rank,
            })
            .collect())
    }
}
