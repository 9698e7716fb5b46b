//! CLI argument validation functions
//!
//! Value parsers for arguments that need more than clap's built-in checks.

use std::fs;
use std::path::PathBuf;

use crate::models::RunStatus;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Validate rollback steps is a positive number
pub fn validate_rollback_steps(steps_str: &str) -> Result<u32, String> {
    let steps: u32 = steps_str.parse().map_err(|_| {
        format!("Rollback steps must be a valid positive number, got: '{}'", steps_str)
    })?;

    if steps == 0 {
        return Err("Rollback steps must be greater than 0".to_string());
    }

    if steps > 100 {
        return Err("Rollback steps cannot exceed 100 for safety reasons".to_string());
    }

    Ok(steps)
}

pub fn validate_status(status_str: &str) -> Result<RunStatus, String> {
    status_str.parse()
}

/// Input version hash: non-empty, no whitespace
pub fn validate_fingerprint(value: &str) -> Result<String, String> {
    let value = value.trim();

    if value.is_empty() {
        return Err("Fingerprint cannot be empty".to_string());
    }

    if value.chars().any(char::is_whitespace) {
        return Err(format!("Fingerprint cannot contain whitespace, got: '{}'", value));
    }

    Ok(value.to_string())
}

/// Run ids are serial values, so always positive
pub fn validate_run_id(id_str: &str) -> Result<i32, String> {
    let id: i32 = id_str
        .trim()
        .parse()
        .map_err(|_| format!("Run id must be a positive integer, got: '{}'", id_str))?;

    if id <= 0 {
        return Err(format!("Run id must be a positive integer, got: '{}'", id_str));
    }

    Ok(id)
}

pub fn validate_limit(limit_str: &str) -> Result<i64, String> {
    let limit: i64 = limit_str
        .parse()
        .map_err(|_| format!("Limit must be a number between 1 and 1000, got: '{}'", limit_str))?;

    if !(1..=1000).contains(&limit) {
        return Err(format!("Limit must be between 1 and 1000, got: {}", limit));
    }

    Ok(limit)
}

/// RFC 3339 timestamp with an offset
pub fn validate_timestamp(value: &str) -> Result<jiff::Timestamp, String> {
    value
        .parse()
        .map_err(|e| format!("Invalid RFC 3339 timestamp '{}': {}", value, e))
}
