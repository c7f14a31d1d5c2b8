use std::sync::Arc;
use std::time::Duration;

use crate::core::errors::RagError;
use crate::llm::{CompletionRequest, LlmProvider};
use crate::logs::LogEntry;

use super::prompt::{answer_prompt, ANSWER_INSTRUCTIONS, NO_EVIDENCE_ANSWER};

/// Writes the final answer from judge-approved evidence only.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// With no approved entries the LLM is never called and the fixed
    /// no-evidence answer is returned. Transport failures and timeouts are
    /// surfaced as `GenerationFailed`.
    pub async fn generate(&self, query: &str, approved: &[LogEntry]) -> Result<String, RagError> {
        if approved.is_empty() {
            return Ok(NO_EVIDENCE_ANSWER.to_string());
        }

        let request = CompletionRequest::new(ANSWER_INSTRUCTIONS, answer_prompt(query, approved))
            .with_temperature(0.2);

        match tokio::time::timeout(self.timeout, self.llm.complete(request)).await {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(err)) => Err(RagError::GenerationFailed(format!(
                "{}: {}",
                self.llm.name(),
                err
            ))),
            Err(_) => Err(RagError::GenerationFailed(format!(
                "{}: timed out after {:?}",
                self.llm.name(),
                self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::core::errors::ProviderError;
    use crate::logs::LogLevel;

    #[derive(Default)]
    struct RecordingLlm {
        requests: Mutex<Vec<CompletionRequest>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        fn name(&self) -> &str {
            "recording"
        }

        async fn health_check(&self) -> Result<bool, ProviderError> {
            Ok(true)
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ProviderError::Status {
                    status: 500,
                    body: "model not loaded".to_string(),
                });
            }
            Ok("  The connection was refused, then retried.  ".to_string())
        }
    }

    fn recorded(llm: &RecordingLlm) -> Vec<CompletionRequest> {
        llm.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn empty_evidence_skips_the_llm() {
        let llm = Arc::new(RecordingLlm::default());
        let generator = AnswerGenerator::new(llm.clone(), Duration::from_secs(1));

        let text = generator.generate("why?", &[]).await.expect("fallback answer");

        assert_eq!(text, NO_EVIDENCE_ANSWER);
        assert!(recorded(&llm).is_empty());
    }

    #[tokio::test]
    async fn sends_persona_and_ordered_evidence() {
        let llm = Arc::new(RecordingLlm::default());
        let generator = AnswerGenerator::new(llm.clone(), Duration::from_secs(1));
        let evidence = vec![
            LogEntry::new(Utc::now(), LogLevel::Error, "connection refused"),
            LogEntry::new(Utc::now(), LogLevel::Warning, "retrying connection"),
        ];

        let text = generator.generate("why?", &evidence).await.expect("answer");

        assert_eq!(text, "The connection was refused, then retried.");
        let requests = recorded(&llm);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].instructions, ANSWER_INSTRUCTIONS);
        let refused = requests[0].prompt.find("connection refused").expect("first entry");
        let retrying = requests[0].prompt.find("retrying connection").expect("second entry");
        assert!(refused < retrying);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_generation_failed() {
        let llm = Arc::new(RecordingLlm {
            fail: true,
            ..Default::default()
        });
        let generator = AnswerGenerator::new(llm, Duration::from_secs(1));
        let evidence = vec![LogEntry::new(Utc::now(), LogLevel::Error, "boom")];

        assert!(matches!(
            generator.generate("why?", &evidence).await,
            Err(RagError::GenerationFailed(_))
        ));
    }

    #[tokio::test]
    async fn timeout_surfaces_as_generation_failed() {
        let llm = Arc::new(RecordingLlm {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let generator = AnswerGenerator::new(llm, Duration::from_millis(20));
        let evidence = vec![LogEntry::new(Utc::now(), LogLevel::Error, "boom")];

        let err = generator.generate("why?", &evidence).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
