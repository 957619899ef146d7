use crate::core::etl::Stage;
use crate::core::{mean, report};
use crate::domain::model::{DataCategory, RecordSet};
use crate::utils::error::{EtlError, Result};
use serde_json::{Number, Value};

pub const REQUIRED_COLUMNS: [&str; 2] = ["price", "quantity"];
pub const HIGH_VALUE_THRESHOLD: f64 = 1000.0;
pub const PREMIUM_PRICE_THRESHOLD: f64 = 50.0;
pub const HIGH_DISCOUNT_THRESHOLD: f64 = 0.1;

/// Derives `total`, `category`, `premium` and, when a discount column is
/// present, `discounted`. The flags describe the whole record set and are
/// written uniformly to every row.
#[derive(Debug, Default, Clone)]
pub struct Transformer;

impl Transformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, data: &RecordSet) -> Option<RecordSet> {
        report(Stage::Transform, self.try_transform(data))
    }

    pub fn try_transform(&self, data: &RecordSet) -> Result<RecordSet> {
        validate_schema(data)?;

        let mut out = data.clone();
        calculate_totals(&mut out)?;
        categorize(&mut out)?;
        flag_premium(&mut out)?;
        flag_discounted(&mut out)?;

        tracing::info!(rows = out.len(), "🔧 Data transformation completed successfully");
        Ok(out)
    }
}

fn validate_schema(data: &RecordSet) -> Result<()> {
    if data.is_empty() {
        return Err(EtlError::ValidationFailure {
            message: "empty record set provided".to_string(),
        });
    }

    let missing = data.missing_columns(&REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(EtlError::ValidationFailure {
            message: format!("missing required columns: {:?}", missing),
        });
    }
    Ok(())
}

fn calculate_totals(data: &mut RecordSet) -> Result<()> {
    let totals = data
        .rows()
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let price = data.value(i, "price").unwrap_or(&Value::Null);
            let quantity = data.value(i, "quantity").unwrap_or(&Value::Null);
            multiply(price, quantity).map_err(|e| match e {
                EtlError::ValidationFailure { message } => EtlError::ValidationFailure {
                    message: format!("row {}: {}", i, message),
                },
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    data.set_column("total", totals)
}

fn categorize(data: &mut RecordSet) -> Result<()> {
    let total_sum: f64 = data.numeric_column("total")?.iter().sum();
    let category = if total_sum > HIGH_VALUE_THRESHOLD {
        DataCategory::High
    } else {
        DataCategory::Low
    };
    tracing::debug!(total_sum, %category, "categorized record set");
    data.fill_column("category", Value::String(category.as_str().to_string()))
}

fn flag_premium(data: &mut RecordSet) -> Result<()> {
    let avg_price = mean(&data.numeric_column("price")?).unwrap_or(0.0);
    let premium = avg_price > PREMIUM_PRICE_THRESHOLD;
    tracing::debug!(avg_price, premium, "flagged premium");
    data.fill_column("premium", Value::Bool(premium))
}

fn flag_discounted(data: &mut RecordSet) -> Result<()> {
    if !data.has_column("discount") {
        return Ok(());
    }

    let avg_discount = mean(&data.numeric_column("discount")?);
    let discounted = avg_discount.is_some_and(|d| d > HIGH_DISCOUNT_THRESHOLD);
    tracing::debug!(?avg_discount, discounted, "flagged discounted");
    data.fill_column("discounted", Value::Bool(discounted))
}

/// Integer operands multiply exactly; any float operand gives a float.
/// A null operand gives a null product.
pub(crate) fn multiply(a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    let (Value::Number(x), Value::Number(y)) = (a, b) else {
        return Err(EtlError::ValidationFailure {
            message: format!("cannot multiply non-numeric values {} and {}", a, b),
        });
    };

    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x
            .checked_mul(y)
            .map(|p| Value::Number(p.into()))
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("{} * {} overflows", x, y),
            });
    }

    let product = x.as_f64().unwrap_or(f64::NAN) * y.as_f64().unwrap_or(f64::NAN);
    Number::from_f64(product)
        .map(Value::Number)
        .ok_or_else(|| EtlError::ProcessingError {
            message: format!("{} * {} is not a finite number", x, y),
        })
}
