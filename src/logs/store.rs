//! In-memory dataset for the current session, with summary and filtering.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::entry::{LogEntry, LogLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub total_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRequest {
    pub level: Option<String>,
    pub keyword: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl FilterRequest {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(level) = self.level.as_deref().filter(|l| !l.trim().is_empty()) {
            if entry.level != LogLevel::parse(level) {
                return false;
            }
        }

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            let keyword = keyword.to_lowercase();
            let in_message = entry.message.to_lowercase().contains(&keyword);
            let in_source = entry
                .source
                .as_deref()
                .map(|s| s.to_lowercase().contains(&keyword))
                .unwrap_or(false);
            if !in_message && !in_source {
                return false;
            }
        }

        if let Some(start) = self.start_date {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if entry.timestamp > end {
                return false;
            }
        }

        true
    }
}

/// The session's current dataset. Uploads replace it wholesale.
#[derive(Clone, Default)]
pub struct LogStore {
    entries: Arc<RwLock<Arc<Vec<LogEntry>>>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, entries: Vec<LogEntry>) {
        *self.entries.write().await = Arc::new(entries);
    }

    pub async fn snapshot(&self) -> Arc<Vec<LogEntry>> {
        self.entries.read().await.clone()
    }

    pub async fn summary(&self) -> LogSummary {
        summarize(&self.snapshot().await)
    }

    pub async fn filter(&self, criteria: &FilterRequest) -> Vec<LogEntry> {
        self.snapshot()
            .await
            .iter()
            .filter(|entry| criteria.matches(entry))
            .cloned()
            .collect()
    }
}

pub fn summarize(entries: &[LogEntry]) -> LogSummary {
    LogSummary {
        total_count: entries.len(),
        error_count: entries.iter().filter(|e| e.level == LogLevel::Error).count(),
        warning_count: entries.iter().filter(|e| e.level == LogLevel::Warning).count(),
        start_time: entries.iter().map(|e| e.timestamp).min(),
        end_time: entries.iter().map(|e| e.timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).single().expect("valid time")
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            LogEntry::new(at(5), LogLevel::Error, "Connection refused").with_source("db-pool"),
            LogEntry::new(at(1), LogLevel::Warning, "retrying connection"),
            LogEntry::new(at(9), LogLevel::Info, "heartbeat ok").with_source("agent"),
            LogEntry::new(at(7), LogLevel::Error, "disk full"),
        ]
    }

    #[test]
    fn summary_counts_levels_and_bounds() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.start_time, Some(at(1)));
        assert_eq!(summary.end_time, Some(at(9)));
    }

    #[test]
    fn empty_summary_has_no_bounds() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.start_time, None);
        assert_eq!(summary.end_time, None);
    }

    #[tokio::test]
    async fn filters_by_level_keyword_and_dates() {
        let store = LogStore::new();
        store.replace(sample()).await;

        let errors = store
            .filter(&FilterRequest {
                level: Some("error".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(errors.len(), 2);

        let connection = store
            .filter(&FilterRequest {
                keyword: Some("CONNECTION".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(connection.len(), 2);

        let by_source = store
            .filter(&FilterRequest {
                keyword: Some("agent".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_source.len(), 1);

        let window = store
            .filter(&FilterRequest {
                start_date: Some(at(5)),
                end_date: Some(at(7)),
                ..Default::default()
            })
            .await;
        let messages: Vec<_> = window.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Connection refused", "disk full"]);
    }

    #[tokio::test]
    async fn replace_discards_previous_dataset() {
        let store = LogStore::new();
        store.replace(sample()).await;
        store
            .replace(vec![LogEntry::new(at(0), LogLevel::Info, "fresh")])
            .await;
        assert_eq!(store.summary().await.total_count, 1);
    }
}
