use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::path::{Component, Path};
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// A bare file name: one normal path component, no separators or `..`.
pub fn validate_file_name(field_name: &str, name: &str) -> Result<()> {
    validate_path(field_name, name)?;

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid(
            field_name,
            name,
            "Must be a plain file name without directories",
        )),
    }
}

/// Table names cannot be bound as parameters, so they are restricted to
/// plain identifiers before being placed in command text.
pub fn validate_sql_identifier(field_name: &str, identifier: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .map_err(|e| invalid(field_name, identifier, format!("Invalid pattern: {}", e)))?;

    if pattern.is_match(identifier) {
        Ok(())
    } else {
        Err(invalid(
            field_name,
            identifier,
            "Must start with a letter or underscore and contain only letters, digits and underscores",
        ))
    }
}

/// Empty (storage off), `sqlite:` URLs, `:memory:` or a plain file path.
pub fn validate_storage_url(field_name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with("sqlite:") {
        return Ok(());
    }

    if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(invalid(
            field_name,
            value,
            format!(
                "Unsupported storage scheme: {}; use sqlite://<path> or a file path",
                scheme
            ),
        ));
    }

    validate_path(field_name, trimmed)
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_timeout(field_name: &str, timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(invalid(
            field_name,
            &format!("{:?}", timeout),
            "Timeout must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_endpoint", "https://example.com").is_ok());
        assert!(validate_url("api_endpoint", "http://example.com").is_ok());
        assert!(validate_url("api_endpoint", "").is_err());
        assert!(validate_url("api_endpoint", "invalid-url").is_err());
        assert!(validate_url("api_endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("output_file", "output.csv").is_ok());
        assert!(validate_file_name("output_file", "").is_err());
        assert!(validate_file_name("output_file", "../output.csv").is_err());
        assert!(validate_file_name("output_file", "nested/output.csv").is_err());
        assert!(validate_file_name("output_file", "/tmp/output.csv").is_err());
    }

    #[test]
    fn test_validate_sql_identifier() {
        assert!(validate_sql_identifier("table", "sales").is_ok());
        assert!(validate_sql_identifier("table", "_sales_2024").is_ok());
        assert!(validate_sql_identifier("table", "2024_sales").is_err());
        assert!(validate_sql_identifier("table", "sales; DROP TABLE users").is_err());
        assert!(validate_sql_identifier("table", "").is_err());
    }

    #[test]
    fn test_validate_storage_url() {
        assert!(validate_storage_url("storage_url", "").is_ok());
        assert!(validate_storage_url("storage_url", "sqlite://sales.db").is_ok());
        assert!(validate_storage_url("storage_url", "sqlite::memory:").is_ok());
        assert!(validate_storage_url("storage_url", ":memory:").is_ok());
        assert!(validate_storage_url("storage_url", "./data/sales.db").is_ok());
        assert!(validate_storage_url("storage_url", "postgresql://etl@localhost/sales").is_err());
        assert!(validate_storage_url("storage_url", "mysql://root@db/sales").is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert!(validate_timeout("request_timeout", Duration::from_secs(30)).is_ok());
        assert!(validate_timeout("request_timeout", Duration::ZERO).is_err());
    }
}
