use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config at '{path}': expected {expected}")]
    WrongType { path: String, expected: String },
    #[error("Invalid config at '{path}': must be between {min} and {max}")]
    OutOfRange { path: String, min: u64, max: u64 },
    #[error("Invalid config at '{path}': value cannot be empty")]
    Empty { path: String },
    #[error("Failed to read config: {0}")]
    Unreadable(String),
}

pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_non_empty_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, u16::MAX as u64)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            u64::MAX,
        )?;
    }

    if let Some(ollama) = expect_optional_object(root, "ollama")? {
        validate_non_empty_string_field(ollama, "ollama.base_url", "base_url")?;
        validate_non_empty_string_field(ollama, "ollama.model", "model")?;
        validate_non_empty_string_field(ollama, "ollama.embedding_model", "embedding_model")?;
        validate_u64_field(
            ollama,
            "ollama.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 100)?;
        validate_u64_field(rag, "rag.grader_concurrency", "grader_concurrency", 1, 64)?;
        validate_u64_field(rag, "rag.grade_timeout_secs", "grade_timeout_secs", 1, 3_600)?;
        validate_u64_field(
            rag,
            "rag.generation_timeout_secs",
            "generation_timeout_secs",
            1,
            3_600,
        )?;
        validate_u64_field(rag, "rag.embed_timeout_secs", "embed_timeout_secs", 1, 3_600)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ConfigError::OutOfRange {
            path: path.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: format!("{}[{}]", path, index),
            });
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::WrongType {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}
