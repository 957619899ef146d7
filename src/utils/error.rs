use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("No data rows in {source_name}")]
    EmptyData { source_name: String },

    #[error("Failed to parse {source_name}: {message}")]
    ParseError {
        source_name: String,
        message: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailure { message: String },

    #[error("API request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected API response: {message}")]
    ResponseError { message: String },

    #[error("Storage connection string is not configured")]
    StorageUnconfigured,

    #[error("Storage write failed: {0}")]
    StorageWriteError(#[from] rusqlite::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Extraction,
    Validation,
    Remote,
    Storage,
    Configuration,
    Processing,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::NotFound { .. } | EtlError::EmptyData { .. } | EtlError::ParseError { .. } => {
                ErrorCategory::Extraction
            }
            EtlError::ValidationFailure { .. } => ErrorCategory::Validation,
            EtlError::NetworkError(_) | EtlError::ResponseError { .. } => ErrorCategory::Remote,
            EtlError::StorageUnconfigured | EtlError::StorageWriteError(_) => ErrorCategory::Storage,
            EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_) | EtlError::IoError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::NotFound { .. } => "Check that the input path exists and is readable",
            EtlError::EmptyData { .. } => "Provide a source with a header and at least one data row",
            EtlError::ParseError { .. } => "Make sure every row has the same number of fields as the header",
            EtlError::ValidationFailure { .. } => "Include numeric price and quantity columns in the source",
            EtlError::NetworkError(_) => "Check network connectivity and the API_ENDPOINT setting",
            EtlError::ResponseError { .. } => "Check the resource path and the credential passed with --api-key",
            EtlError::StorageUnconfigured => "Set DATABASE_URL to enable storage writes",
            EtlError::StorageWriteError(_) => "Check that the database is reachable and the table is writable",
            EtlError::CsvError(_) => "Inspect the record set for values that cannot be written as CSV",
            EtlError::IoError(_) => "Check file permissions and free disk space",
            EtlError::InvalidConfigValueError { .. } => "Fix the reported configuration value and retry",
            EtlError::ProcessingError { .. } => "Inspect the input data for out-of-range values",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let not_found = EtlError::NotFound {
            path: "missing.csv".to_string(),
        };
        assert_eq!(not_found.category(), ErrorCategory::Extraction);
        assert_eq!(not_found.to_string(), "File not found: missing.csv");

        assert_eq!(
            EtlError::StorageUnconfigured.category(),
            ErrorCategory::Storage
        );
        assert_eq!(
            EtlError::ValidationFailure {
                message: "missing quantity".to_string()
            }
            .category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_recovery_suggestion_for_unconfigured_storage() {
        assert!(EtlError::StorageUnconfigured
            .recovery_suggestion()
            .contains("DATABASE_URL"));
    }
}
