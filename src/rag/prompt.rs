//! Fixed instruction sets for the judge and the answer writer.

use crate::logs::LogEntry;

/// Returned when grading leaves no evidence; the LLM is not called.
pub const NO_EVIDENCE_ANSWER: &str = "No relevant log evidence was found for this question. \
The closest log entries were retrieved and checked, but none of them appeared related to what you asked.";

pub const GRADER_INSTRUCTIONS: &str = "You are a log relevance checker. \
Decide whether a single log entry could help answer the operator's question.

Consider the log entry relevant if:
- It directly answers the question.
- It provides related context, such as related system events or the same component or timeframe.
- It is a WARNING-level entry and the question is about errors or failures. Warnings often precede or accompany errors and explain their cause, so treat them as relevant context for error questions.

Answer ONLY with 'YES' or 'NO'.";

pub const ANSWER_INSTRUCTIONS: &str = "You are a senior site reliability engineer analyzing logs. \
Explain EXACTLY what happened, based only on the provided log sequence.

Guidelines:
1. Follow the TIMESTAMP order. State what happened first and what happened next.
2. Explain the pattern behind the entries instead of restating raw log lines.
3. Do NOT claim the system crashed or suffered an outage unless a log shows a terminal failure such as a CRITICAL entry or a shutdown.
4. If an ERROR is followed by retries or recovery messages, say that the system attempted recovery.
5. Keep the answer to a short narrative: \"First X happened, then Y happened.\"";

pub fn grading_prompt(query: &str, entry: &LogEntry) -> String {
    format!(
        "Question: {}\nLog entry: {}\n\nIs this log entry relevant? Answer YES or NO.",
        query.trim(),
        entry.context_line()
    )
}

/// `entries` must already be in retrieval rank order.
pub fn answer_prompt(query: &str, entries: &[LogEntry]) -> String {
    let sequence = entries
        .iter()
        .map(LogEntry::context_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Log Sequence:\n{}\n\nUser Question: {}\n\nAnalysis:",
        sequence,
        query.trim()
    )
}
