use serde_json::{json, Value};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_GRADER_CONCURRENCY: usize = 4;
pub const DEFAULT_GRADE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;

/// Built-in configuration that `config.yml` is merged over.
pub fn default_config() -> Value {
    json!({
        "server": {
            "host": DEFAULT_HOST,
            "port": DEFAULT_PORT,
            "cors_allowed_origins": [],
            "max_upload_bytes": DEFAULT_MAX_UPLOAD_BYTES,
        },
        "ollama": {
            "base_url": DEFAULT_OLLAMA_BASE_URL,
            "model": DEFAULT_OLLAMA_MODEL,
            "embedding_model": DEFAULT_EMBEDDING_MODEL,
            "request_timeout_secs": DEFAULT_REQUEST_TIMEOUT_SECS,
        },
        "rag": {
            "top_k": DEFAULT_TOP_K,
            "grader_concurrency": DEFAULT_GRADER_CONCURRENCY,
            "grade_timeout_secs": DEFAULT_GRADE_TIMEOUT_SECS,
            "generation_timeout_secs": DEFAULT_GENERATION_TIMEOUT_SECS,
            "embed_timeout_secs": DEFAULT_EMBED_TIMEOUT_SECS,
        }
    })
}
