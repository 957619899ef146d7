use crate::config::PipelineConfig;
use crate::core::etl::Stage;
use crate::core::report;
use crate::domain::model::RecordSet;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde_json::{Number, Value};
use std::path::Path;

/// Pulls tabular records from a delimited file or a remote JSON endpoint.
pub struct Extractor {
    config: PipelineConfig,
    client: Client,
}

impl Extractor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn extract_from_file(&self, path: impl AsRef<Path>) -> Option<RecordSet> {
        let path = path.as_ref();
        let data = report(Stage::Extract, self.try_extract_from_file(path))?;
        tracing::info!(
            rows = data.len(),
            path = %path.display(),
            "📥 Successfully extracted records from file"
        );
        Some(data)
    }

    pub fn try_extract_from_file(&self, path: impl AsRef<Path>) -> Result<RecordSet> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EtlError::NotFound {
                path: path.display().to_string(),
            });
        }

        let bytes = std::fs::read(path)?;
        parse_csv(&bytes, &path.display().to_string())
    }

    pub async fn extract_from_remote(&self, resource: &str, credential: &str) -> Option<RecordSet> {
        let data = report(
            Stage::Extract,
            self.try_extract_from_remote(resource, credential).await,
        )?;
        tracing::info!(rows = data.len(), resource, "📥 Successfully extracted records from API");
        Some(data)
    }

    /// GET `{api_endpoint}/{resource}` with a bearer credential. The
    /// credential only ever travels in the `Authorization` header.
    pub async fn try_extract_from_remote(&self, resource: &str, credential: &str) -> Result<RecordSet> {
        let url = format!(
            "{}/{}",
            self.config.api_endpoint().trim_end_matches('/'),
            resource.trim_start_matches('/')
        );

        tracing::debug!("Making API request to: {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::ResponseError {
                message: format!("{} returned status {}", url, status),
            });
        }

        let body = response.bytes().await?;
        let json: Value = serde_json::from_slice(&body).map_err(|e| EtlError::ResponseError {
            message: format!("body is not valid JSON: {}", e),
        })?;

        records_from_json(json)
    }
}

/// Parses comma-delimited text with a header row.
pub fn parse_csv(data: &[u8], source_name: &str) -> Result<RecordSet> {
    let parse_error = |e: csv::Error| EtlError::ParseError {
        source_name: source_name.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers().map_err(parse_error)?.clone();
    if headers.is_empty() {
        return Err(EtlError::EmptyData {
            source_name: source_name.to_string(),
        });
    }

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for (i, name) in headers.iter().enumerate() {
        if name.is_empty() {
            return Err(EtlError::ParseError {
                source_name: source_name.to_string(),
                message: format!("header field {} is blank", i + 1),
            });
        }
        if columns.iter().any(|c| c == name) {
            return Err(EtlError::ParseError {
                source_name: source_name.to_string(),
                message: format!("duplicate column '{}'", name),
            });
        }
        columns.push(name.to_string());
    }

    let mut set = RecordSet::new(columns);
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        set.push_row(record.iter().map(parse_cell).collect())?;
    }

    if set.is_empty() {
        return Err(EtlError::EmptyData {
            source_name: source_name.to_string(),
        });
    }

    Ok(set)
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

/// Flattens a JSON array of objects; columns follow first-seen key order.
fn records_from_json(json: Value) -> Result<RecordSet> {
    let Value::Array(items) = json else {
        return Err(EtlError::ResponseError {
            message: "expected a JSON array of objects".to_string(),
        });
    };

    let mut objects = Vec::with_capacity(items.len());
    let mut columns: Vec<String> = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(EtlError::ResponseError {
                message: format!("array element {} is not an object", i),
            });
        };
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut set = RecordSet::new(columns.clone());
    for mut obj in objects {
        let row = columns
            .iter()
            .map(|c| obj.remove(c).unwrap_or(Value::Null))
            .collect();
        set.push_row(row)?;
    }
    Ok(set)
}
