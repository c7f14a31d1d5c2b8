//! Log records and the ingestion side of the session.

mod entry;
mod ingest;
mod store;

pub use entry::{LogEntry, LogLevel};
pub use ingest::{parse_csv, parse_csv_at, parse_timestamp, IngestError, IngestReport};
pub use store::{summarize, FilterRequest, LogStore, LogSummary};
