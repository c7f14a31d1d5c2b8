use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::logs::{parse_csv, FilterRequest};
use crate::state::AppState;

/// Replaces the session dataset with an uploaded CSV file and rebuilds the
/// vector index over it. Nothing changes if embedding fails.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.server.max_upload_bytes;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_csv_filename(&filename) {
            return Err(ApiError::BadRequest("Only CSV files are allowed".to_string()));
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("Missing multipart field 'file'".to_string()));
    };
    if bytes.len() as u64 > limit {
        return Err(ApiError::PayloadTooLarge(format!(
            "Upload exceeds {} bytes",
            limit
        )));
    }

    let report = parse_csv(&bytes).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let indexed = state.ingest(report.entries.clone()).await?;

    tracing::info!(
        file = %filename,
        records = report.records_processed,
        skipped = report.rows_skipped,
        "Log file ingested"
    );

    Ok(Json(json!({
        "message": format!("Successfully processed {} log entries", report.records_processed),
        "records_processed": report.records_processed,
        "rows_skipped": report.rows_skipped,
        "timestamp_fallbacks": report.timestamp_fallbacks,
        "indexed": indexed.indexed,
    })))
}

pub async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.logs.summary().await)
}

pub async fn filter(
    State(state): State<Arc<AppState>>,
    Json(criteria): Json<FilterRequest>,
) -> impl IntoResponse {
    Json(state.logs.filter(&criteria).await)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn is_csv_filename(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
