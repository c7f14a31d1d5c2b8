//! Binary relevance judge over retrieved candidates.
//!
//! Each candidate is graded by an independent LLM call. Calls run
//! concurrently up to a fixed fan-out and are recombined in candidate order.
//! Anything other than a clear YES excludes the candidate: unparseable
//! answers, transport errors, timeouts and panicked tasks all grade as
//! not relevant.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::llm::{CompletionRequest, LlmProvider};

use super::index::RetrievalCandidate;
use super::prompt::{grading_prompt, GRADER_INSTRUCTIONS};

/// Rationale recorded when the judge call itself failed.
pub const GRADING_FAILED: &str = "grading_failed";

const MAX_RATIONALE_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct GradeResult {
    pub candidate: RetrievalCandidate,
    pub relevant: bool,
    pub rationale: Option<String>,
}

#[derive(Debug)]
enum JudgeOutcome {
    Verdict { relevant: bool, raw: String },
    Unparseable(String),
    Failed(String),
}

#[derive(Clone)]
pub struct RelevanceGrader {
    llm: Arc<dyn LlmProvider>,
    concurrency: usize,
    timeout: Duration,
}

impl RelevanceGrader {
    pub fn new(llm: Arc<dyn LlmProvider>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            llm,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Grades every candidate; the result has the same length and order as
    /// `candidates`. Dropping the returned future aborts in-flight calls.
    pub async fn grade(&self, query: &str, candidates: &[RetrievalCandidate]) -> Vec<GradeResult> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (position, candidate) in candidates.iter().enumerate() {
            let llm = Arc::clone(&self.llm);
            let semaphore = Arc::clone(&semaphore);
            let limit = self.timeout;
            let request = CompletionRequest::new(GRADER_INSTRUCTIONS, grading_prompt(query, candidate.log()))
                .with_temperature(0.0)
                .with_max_tokens(8);

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let outcome = judge(llm.as_ref(), request, limit).await;
                        drop(permit);
                        outcome
                    }
                    Err(_) => JudgeOutcome::Failed("grader semaphore closed".to_string()),
                };
                (position, outcome)
            });
        }

        let mut slots: Vec<Option<JudgeOutcome>> = candidates.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => slots[position] = Some(outcome),
                Err(err) => tracing::warn!("Grading task did not complete: {}", err),
            }
        }

        candidates
            .iter()
            .zip(slots)
            .map(|(candidate, slot)| {
                let outcome = slot
                    .unwrap_or_else(|| JudgeOutcome::Failed("grading task aborted".to_string()));
                to_grade(candidate.clone(), outcome)
            })
            .collect()
    }
}

async fn judge(llm: &dyn LlmProvider, request: CompletionRequest, limit: Duration) -> JudgeOutcome {
    match tokio::time::timeout(limit, llm.complete(request)).await {
        Ok(Ok(raw)) => match parse_relevance_verdict(&raw) {
            Some(relevant) => JudgeOutcome::Verdict { relevant, raw },
            None => JudgeOutcome::Unparseable(raw),
        },
        Ok(Err(err)) => JudgeOutcome::Failed(format!("{}: {}", llm.name(), err)),
        Err(_) => JudgeOutcome::Failed(format!("{}: timed out after {:?}", llm.name(), limit)),
    }
}

fn to_grade(candidate: RetrievalCandidate, outcome: JudgeOutcome) -> GradeResult {
    match outcome {
        JudgeOutcome::Verdict { relevant, raw } => GradeResult {
            candidate,
            relevant,
            rationale: Some(truncate(raw.trim())),
        },
        JudgeOutcome::Unparseable(raw) => {
            tracing::debug!(
                rank = candidate.rank,
                "Unparseable relevance verdict, excluding candidate: {:?}",
                raw
            );
            GradeResult {
                candidate,
                relevant: false,
                rationale: Some(format!("unparseable_verdict: {}", truncate(raw.trim()))),
            }
        }
        JudgeOutcome::Failed(reason) => {
            tracing::warn!(
                rank = candidate.rank,
                rationale = GRADING_FAILED,
                "Relevance grading failed: {}",
                reason
            );
            GradeResult {
                candidate,
                relevant: false,
                rationale: Some(GRADING_FAILED.to_string()),
            }
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_RATIONALE_CHARS).collect()
}

/// Labels a judge may put before its verdict, e.g. `Answer: NO`.
const VERDICT_LABELS: [&str; 4] = ["ANSWER", "VERDICT", "RELEVANT", "RESPONSE"];

/// Reads a free-text YES/NO judgement.
///
/// Only a leading YES or NO counts, optionally after a short label such as
/// `Answer:` or `Final answer:`. Anything else, including negated or hedged
/// phrasing like "I would not say yes", is `None`, which callers treat as
/// not relevant.
pub fn parse_relevance_verdict(raw: &str) -> Option<bool> {
    let mut words = raw
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase());

    let mut first = words.next()?;
    if first == "FINAL" {
        first = words.next()?;
        if first != "ANSWER" && first != "VERDICT" {
            return None;
        }
    }
    if VERDICT_LABELS.contains(&first.as_str()) {
        first = words.next()?;
    }

    match first.as_str() {
        "YES" => Some(true),
        "NO" => Some(false),
        _ => None,
    }
}
