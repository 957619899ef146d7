pub mod etl;
pub mod extract;
pub mod load;
pub mod metrics;
pub mod transform;
pub mod validate;

pub use crate::domain::model::{DataCategory, Metrics, RecordSet};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;

use crate::core::etl::Stage;
use crate::utils::error::EtlError;

/// Stage boundary: an error becomes a log entry and an absent value.
pub(crate) fn report<T>(stage: Stage, result: std::result::Result<T, EtlError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(
                stage = %stage,
                category = ?e.category(),
                error = %e,
                "❌ {} stage error",
                stage
            );
            None
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
