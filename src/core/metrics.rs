use crate::core::mean;
use crate::domain::model::{Metrics, RecordSet};
use crate::utils::error::{EtlError, Result};

#[derive(Debug, Default, Clone)]
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Informational only: failures are logged as warnings.
    pub fn calculate(&self, data: &RecordSet) -> Option<Metrics> {
        match self.try_calculate(data) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot calculate metrics");
                None
            }
        }
    }

    pub fn try_calculate(&self, data: &RecordSet) -> Result<Metrics> {
        if data.is_empty() {
            return Err(EtlError::ValidationFailure {
                message: "cannot calculate metrics for an empty record set".to_string(),
            });
        }

        let metrics = Metrics {
            total_revenue: sum_of(data, "total")?,
            total_items: sum_of(data, "quantity")?,
            avg_price: if data.has_column("price") {
                mean(&data.numeric_column("price")?).unwrap_or(0.0)
            } else {
                0.0
            },
            record_count: data.len(),
        };

        tracing::info!(
            total_revenue = metrics.total_revenue,
            total_items = metrics.total_items,
            avg_price = metrics.avg_price,
            record_count = metrics.record_count,
            "📊 Calculated metrics"
        );
        Ok(metrics)
    }
}

fn sum_of(data: &RecordSet, column: &str) -> Result<f64> {
    if !data.has_column(column) {
        return Ok(0.0);
    }
    Ok(data.numeric_column(column)?.iter().sum())
}
