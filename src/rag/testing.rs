//! Deterministic stand-ins for the embedding and LLM collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::core::errors::ProviderError;
use crate::llm::{CompletionRequest, EmbeddingProvider, LlmProvider};
use crate::logs::{LogEntry, LogLevel};

/// Feature axes: connection, retry, heartbeat, failure.
const AXES: [&[&str]; 4] = [
    &["connect"],
    &["retr"],
    &["heartbeat"],
    &["fail", "refused", "error"],
];

pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(AXES
            .iter()
            .map(|keys| {
                if keys.iter().any(|k| lower.contains(k)) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect())
    }
}

/// Judges an entry relevant when both the question and the entry mention a
/// connection; writes a fixed recovery-style answer.
pub struct ScriptedLlm {
    pub grading_calls: AtomicUsize,
    pub completed_gradings: AtomicUsize,
    pub answer_requests: Mutex<Vec<CompletionRequest>>,
    pub grading_delay: Duration,
    pub fail_generation: bool,
}

pub const SCRIPTED_ANSWER: &str = "First the database connection was refused, then the client \
started retrying the connection. The system attempted recovery; there is no sign of an outage.";

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            grading_calls: AtomicUsize::new(0),
            completed_gradings: AtomicUsize::new(0),
            answer_requests: Mutex::new(Vec::new()),
            grading_delay: Duration::ZERO,
            fail_generation: false,
        }
    }

    pub fn answer_requests(&self) -> Vec<CompletionRequest> {
        self.answer_requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        if request.prompt.contains("Log entry:") {
            self.grading_calls.fetch_add(1, Ordering::SeqCst);
            if !self.grading_delay.is_zero() {
                tokio::time::sleep(self.grading_delay).await;
            }
            self.completed_gradings.fetch_add(1, Ordering::SeqCst);

            let question = request
                .prompt
                .lines()
                .find(|l| l.starts_with("Question:"))
                .unwrap_or("")
                .to_lowercase();
            let entry = request
                .prompt
                .lines()
                .find(|l| l.starts_with("Log entry:"))
                .unwrap_or("")
                .to_lowercase();
            let relevant = question.contains("connection") && entry.contains("connection");
            return Ok(if relevant { "YES" } else { "NO" }.to_string());
        }

        if let Ok(mut requests) = self.answer_requests.lock() {
            requests.push(request);
        }
        if self.fail_generation {
            return Err(ProviderError::Transport("connection reset by peer".to_string()));
        }
        Ok(SCRIPTED_ANSWER.to_string())
    }
}

/// The three-entry dataset: refused connection, retry warning, heartbeat.
pub fn connection_dataset() -> Vec<LogEntry> {
    let at = |second: u32| {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, second)
            .single()
            .unwrap_or_else(Utc::now)
    };
    vec![
        LogEntry::new(at(1), LogLevel::Error, "connection refused").with_source("db"),
        LogEntry::new(at(2), LogLevel::Warning, "retrying connection").with_source("db"),
        LogEntry::new(at(3), LogLevel::Info, "heartbeat ok").with_source("agent"),
    ]
}
