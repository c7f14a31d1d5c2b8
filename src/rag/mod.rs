//! Agentic retrieval over ingested log entries.
//!
//! A query is embedded and matched against the in-memory [`VectorIndex`];
//! every candidate is then judged by the LLM before it may be used as
//! evidence, and the answer is written only from approved entries.

pub mod generator;
pub mod grader;
pub mod index;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use generator::AnswerGenerator;
pub use grader::{parse_relevance_verdict, GradeResult, RelevanceGrader, GRADING_FAILED};
pub use index::{EmbeddedEntry, RetrievalCandidate, VectorIndex};
pub use orchestrator::{AnswerResponse, Orchestrator, PipelineStage, QueryTrace};
pub use prompt::NO_EVIDENCE_ANSWER;
pub use retriever::Retriever;
pub use service::{IndexReport, RagService};
