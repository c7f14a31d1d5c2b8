//! Query pipeline: retrieve, grade, then generate.
//!
//! Stages: `Idle -> Retrieving -> Grading -> Generating -> Done`, with
//! `Failed` reachable from any non-terminal stage. Rejecting every candidate
//! is not a failure; it takes the no-evidence answer path.

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::RagError;
use crate::logs::LogEntry;

use super::generator::AnswerGenerator;
use super::grader::{GradeResult, RelevanceGrader};
use super::index::RetrievalCandidate;
use super::retriever::Retriever;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Retrieving,
    Grading,
    Generating,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }

    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (Idle, Retrieving) | (Retrieving, Grading) | (Grading, Generating) | (Generating, Done) => {
                true
            }
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Final answer plus the judge-approved evidence it was written from, in
/// retrieval rank order. Empty evidence means the no-evidence path was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub text: String,
    pub evidence: Vec<LogEntry>,
}

impl AnswerResponse {
    pub fn is_fallback(&self) -> bool {
        self.evidence.is_empty()
    }
}

/// Everything one query produced, for rendering an evidence trail.
#[derive(Debug, Clone, Serialize)]
pub struct QueryTrace {
    pub query_id: Uuid,
    pub query: String,
    pub candidates: Vec<RetrievalCandidate>,
    pub grades: Vec<GradeResult>,
    pub response: AnswerResponse,
    pub stages: Vec<PipelineStage>,
}

struct StageTracker {
    current: PipelineStage,
    visited: Vec<PipelineStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: PipelineStage::Idle,
            visited: vec![PipelineStage::Idle],
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal stage transition {:?} -> {:?}",
            self.current,
            next
        );
        tracing::debug!(from = ?self.current, to = ?next, "pipeline stage");
        self.current = next;
        self.visited.push(next);
    }
}

/// Holds no state between calls beyond its index snapshot (via the retriever).
#[derive(Clone)]
pub struct Orchestrator {
    retriever: Retriever,
    grader: RelevanceGrader,
    generator: AnswerGenerator,
    top_k: usize,
}

impl Orchestrator {
    pub fn new(
        retriever: Retriever,
        grader: RelevanceGrader,
        generator: AnswerGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            grader,
            generator,
            top_k,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<AnswerResponse, RagError> {
        Ok(self.answer_with_trace(query).await?.response)
    }

    pub async fn answer_with_trace(&self, query: &str) -> Result<QueryTrace, RagError> {
        let query_id = Uuid::new_v4();
        let span = tracing::info_span!("answer", %query_id);
        self.run(query_id, query).instrument(span).await
    }

    async fn run(&self, query_id: Uuid, query: &str) -> Result<QueryTrace, RagError> {
        let mut stages = StageTracker::new();

        stages.advance(PipelineStage::Retrieving);
        let candidates = match self.retriever.retrieve(query, self.top_k).await {
            Ok(candidates) => candidates,
            Err(err) => {
                stages.advance(PipelineStage::Failed);
                match err {
                    RagError::EmptyIndex => tracing::info!("Query rejected: {}", err),
                    _ => tracing::warn!("Retrieval failed: {}", err),
                }
                return Err(err);
            }
        };

        stages.advance(PipelineStage::Grading);
        let grades = self.grader.grade(query, &candidates).await;

        stages.advance(PipelineStage::Generating);
        let evidence: Vec<LogEntry> = grades
            .iter()
            .filter(|grade| grade.relevant)
            .map(|grade| grade.candidate.log().clone())
            .collect();

        let text = match self.generator.generate(query, &evidence).await {
            Ok(text) => text,
            Err(err) => {
                stages.advance(PipelineStage::Failed);
                tracing::error!("Answer generation failed: {}", err);
                return Err(err);
            }
        };

        stages.advance(PipelineStage::Done);
        tracing::info!(
            candidates = candidates.len(),
            approved = evidence.len(),
            fallback = evidence.is_empty(),
            "Query answered"
        );

        Ok(QueryTrace {
            query_id,
            query: query.to_string(),
            candidates,
            grades,
            response: AnswerResponse { text, evidence },
            stages: stages.visited,
        })
    }
}
