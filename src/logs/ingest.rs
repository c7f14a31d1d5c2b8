//! CSV ingestion: turns an uploaded file into typed `LogEntry` records.
//!
//! Expected header columns are `timestamp`, `level`, `message` and an optional
//! `source`, in any order. Unreadable rows are skipped; an empty or
//! unparseable timestamp falls back to the ingestion time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::entry::{LogEntry, LogLevel};

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("failed to read CSV header: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    #[serde(skip)]
    pub entries: Vec<LogEntry>,
    pub records_processed: usize,
    pub rows_skipped: usize,
    pub timestamp_fallbacks: usize,
}

#[derive(Debug, Default)]
struct ColumnMap {
    timestamp: Option<usize>,
    level: Option<usize>,
    message: Option<usize>,
    source: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = ColumnMap::default();
        for (idx, name) in headers.iter().enumerate() {
            match name.trim().to_lowercase().as_str() {
                "timestamp" => map.timestamp = Some(idx),
                "level" => map.level = Some(idx),
                "message" => map.message = Some(idx),
                "source" => map.source = Some(idx),
                _ => {}
            }
        }
        map
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i))
}

pub fn parse_csv(bytes: &[u8]) -> Result<IngestReport, IngestError> {
    parse_csv_at(bytes, Utc::now())
}

/// Same as [`parse_csv`] with an explicit fallback timestamp.
pub fn parse_csv_at(bytes: &[u8], now: DateTime<Utc>) -> Result<IngestReport, IngestError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let columns = ColumnMap::from_headers(reader.headers()?);
    if columns.message.is_none() {
        tracing::warn!("CSV has no 'message' column; entries will have empty messages");
    }

    let mut entries = Vec::new();
    let mut rows_skipped = 0;
    let mut timestamp_fallbacks = 0;

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!("Skipping CSV row {}: {}", row + 1, err);
                rows_skipped += 1;
                continue;
            }
        };

        let timestamp = match field(&record, columns.timestamp).and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                timestamp_fallbacks += 1;
                now
            }
        };

        let level = LogLevel::parse(field(&record, columns.level).unwrap_or(""));
        let message = field(&record, columns.message).unwrap_or("").to_string();
        let source = field(&record, columns.source)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        entries.push(LogEntry {
            timestamp,
            level,
            message,
            source,
        });
    }

    Ok(IngestReport {
        records_processed: entries.len(),
        entries,
        rows_skipped,
        timestamp_fallbacks,
    })
}

/// Accepts RFC 3339 and naive ISO-8601 forms (naive values are taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single().expect("valid time")
    }

    #[test]
    fn parses_rows_with_all_columns() {
        let csv = "timestamp,level,message,source\n\
                   2024-03-01T10:00:00,ERROR,connection refused,db\n\
                   2024-03-01T10:00:05,warn,retrying connection,\n";
        let report = parse_csv_at(csv.as_bytes(), fixed_now()).expect("csv should parse");

        assert_eq!(report.records_processed, 2);
        assert_eq!(report.rows_skipped, 0);
        assert_eq!(report.timestamp_fallbacks, 0);
        assert_eq!(report.entries[0].level, LogLevel::Error);
        assert_eq!(report.entries[0].source.as_deref(), Some("db"));
        assert_eq!(report.entries[1].level, LogLevel::Warning);
        assert_eq!(report.entries[1].source, None);
        assert_eq!(
            report.entries[1].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 5).single().expect("valid time")
        );
    }

    #[test]
    fn columns_may_appear_in_any_order() {
        let csv = "message,source,level,timestamp\nheartbeat ok,agent,info,2024-03-01 09:00:00\n";
        let report = parse_csv_at(csv.as_bytes(), fixed_now()).expect("csv should parse");
        let entry = &report.entries[0];
        assert_eq!(entry.message, "heartbeat ok");
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.source.as_deref(), Some("agent"));
    }

    #[test]
    fn bad_timestamps_fall_back_to_ingestion_time() {
        let csv = "timestamp,level,message\n,INFO,no time\nyesterday,INFO,bad time\n";
        let report = parse_csv_at(csv.as_bytes(), fixed_now()).expect("csv should parse");
        assert_eq!(report.timestamp_fallbacks, 2);
        assert!(report.entries.iter().all(|e| e.timestamp == fixed_now()));
    }

    #[test]
    fn missing_level_defaults_to_info() {
        let csv = "timestamp,message\n2024-03-01,started\n";
        let report = parse_csv_at(csv.as_bytes(), fixed_now()).expect("csv should parse");
        assert_eq!(report.entries[0].level, LogLevel::Info);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = [b't', b's', 0xff, 0xfe, b'\n'];
        assert!(matches!(
            parse_csv_at(&bytes, fixed_now()),
            Err(IngestError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single().expect("valid time");
        assert_eq!(parse_timestamp("2024-03-01T08:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 08:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("not a time"), None);
        assert_eq!(parse_timestamp("   "), None);
    }
}
