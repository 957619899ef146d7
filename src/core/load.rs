use crate::adapters::sqlite::{SalesRow, SqliteSink};
use crate::adapters::storage::LocalStorage;
use crate::config::PipelineConfig;
use crate::core::etl::Stage;
use crate::core::report;
use crate::domain::model::RecordSet;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_file_name, validate_sql_identifier};
use serde_json::Value;

const STORAGE_COLUMNS: [&str; 3] = ["price", "quantity", "total"];

/// Persists record sets to the output directory and the relational sink.
pub struct Loader<S: Storage = LocalStorage> {
    config: PipelineConfig,
    storage: S,
}

impl Loader<LocalStorage> {
    pub fn new(config: PipelineConfig) -> Self {
        let storage = LocalStorage::new(config.output_directory());
        Self { config, storage }
    }
}

impl<S: Storage> Loader<S> {
    pub fn with_storage(config: PipelineConfig, storage: S) -> Self {
        Self { config, storage }
    }

    pub fn output_path(&self, name: &str) -> String {
        self.storage.resolve(name)
    }

    pub async fn save_to_file(&self, data: &RecordSet, name: &str) -> bool {
        report(Stage::Load, self.try_save_to_file(data, name).await).is_some()
    }

    /// Writes CSV to `{output_directory}/{name}` and returns that path.
    pub async fn try_save_to_file(&self, data: &RecordSet, name: &str) -> Result<String> {
        if data.is_empty() {
            return Err(EtlError::ValidationFailure {
                message: "cannot save an empty record set".to_string(),
            });
        }
        validate_file_name("output_file", name)?;

        let bytes = to_csv(data)?;
        tracing::debug!("Writing {} bytes of CSV to storage", bytes.len());
        self.storage.write_file(name, &bytes).await?;

        let path = self.output_path(name);
        tracing::info!(rows = data.len(), path = %path, "💾 Data saved");
        Ok(path)
    }

    pub fn save_to_storage(&self, data: &RecordSet, table: &str) -> bool {
        report(Stage::Load, self.try_save_to_storage(data, table)).is_some()
    }

    /// Inserts `(price, quantity, total)` for every row as one transaction.
    /// Nothing is opened when the data is empty or storage is unconfigured.
    pub fn try_save_to_storage(&self, data: &RecordSet, table: &str) -> Result<usize> {
        if data.is_empty() {
            return Err(EtlError::ValidationFailure {
                message: "cannot save an empty record set to storage".to_string(),
            });
        }
        if !self.config.storage_enabled() {
            return Err(EtlError::StorageUnconfigured);
        }
        validate_sql_identifier("table", table)?;

        let missing = data.missing_columns(&STORAGE_COLUMNS);
        if !missing.is_empty() {
            return Err(EtlError::ValidationFailure {
                message: format!("missing columns for storage: {:?}", missing),
            });
        }

        let rows: Vec<SalesRow> = (0..data.len())
            .map(|i| SalesRow {
                price: data.value(i, "price").cloned().unwrap_or(Value::Null),
                quantity: data.value(i, "quantity").cloned().unwrap_or(Value::Null),
                total: data.value(i, "total").cloned().unwrap_or(Value::Null),
            })
            .collect();

        let sink = SqliteSink::from_url(self.config.storage_url(), self.config.storage_timeout())?;
        let written = sink.insert_batch(table, &rows)?;

        tracing::info!(rows = written, table, "💾 Successfully saved rows to storage");
        Ok(written)
    }
}

pub fn to_csv(data: &RecordSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(data.columns())?;
    for row in data.rows() {
        writer.write_record(row.iter().map(cell_to_field))?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

fn cell_to_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
