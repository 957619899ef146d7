use crate::core::etl::Stage;
use crate::core::report;
use crate::core::transform::multiply;
use crate::domain::model::RecordSet;
use crate::utils::error::{EtlError, Result};
use serde_json::{json, Value};

/// Clamps negative `price` and `quantity` cells to zero.
#[derive(Debug, Default, Clone)]
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, data: &RecordSet) -> Option<RecordSet> {
        report(Stage::Validate, self.try_clean(data))
    }

    pub fn try_clean(&self, data: &RecordSet) -> Result<RecordSet> {
        if data.is_empty() {
            return Err(EtlError::ValidationFailure {
                message: "empty record set provided for validation".to_string(),
            });
        }

        let mut out = data.clone();
        let price_idx = out.column_index("price");
        let quantity_idx = out.column_index("quantity");
        let total_idx = out.column_index("total");

        let mut negative_prices = 0usize;
        let mut negative_quantities = 0usize;

        for row in out.rows_mut() {
            let mut clamped = false;
            if let Some(i) = price_idx {
                if clamp_negative(&mut row[i]) {
                    negative_prices += 1;
                    clamped = true;
                }
            }
            if let Some(i) = quantity_idx {
                if clamp_negative(&mut row[i]) {
                    negative_quantities += 1;
                    clamped = true;
                }
            }

            // keep total = price * quantity on rows we touched; null when it can't be derived
            if let (true, Some(p), Some(q), Some(t)) = (clamped, price_idx, quantity_idx, total_idx) {
                let total = multiply(&row[p], &row[q]).unwrap_or(Value::Null);
                row[t] = total;
            }
        }

        if negative_prices > 0 {
            tracing::warn!(
                count = negative_prices,
                "Found {} negative prices, setting to 0",
                negative_prices
            );
        }
        if negative_quantities > 0 {
            tracing::warn!(
                count = negative_quantities,
                "Found {} negative quantities, setting to 0",
                negative_quantities
            );
        }

        tracing::info!(rows = out.len(), "✅ Data validation completed successfully");
        Ok(out)
    }
}

/// Zero of the same numeric kind replaces a negative number.
fn clamp_negative(cell: &mut Value) -> bool {
    let Value::Number(n) = cell else {
        return false;
    };

    let is_float = n.is_f64();
    if n.as_f64().is_some_and(|v| v < 0.0) {
        *cell = if is_float { json!(0.0) } else { json!(0) };
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Transformer;

    #[test]
    fn test_clean_negative_values() {
        let input = RecordSet::from_columns([
            ("price", vec![json!(10.0), json!(-5.0), json!(30.0)]),
            ("quantity", vec![json!(2), json!(-1), json!(1)]),
        ])
        .unwrap();

        let result = DataValidator::new().clean(&input).unwrap();

        assert_eq!(
            result.numeric_column("price").unwrap(),
            vec![10.0, 0.0, 30.0]
        );
        assert_eq!(result.numeric_column("quantity").unwrap(), vec![2.0, 0.0, 1.0]);
        assert_eq!(result.value(1, "quantity"), Some(&json!(0)));
        assert_eq!(result.value(1, "price"), Some(&json!(0.0)));
        // caller's copy is untouched
        assert_eq!(input.value(1, "price"), Some(&json!(-5.0)));
    }

    #[test]
    fn test_clean_empty_record_set() {
        let input = RecordSet::new(vec!["price".to_string()]);
        assert!(DataValidator::new().clean(&input).is_none());
    }

    #[test]
    fn test_clean_without_price_or_quantity_columns() {
        let input = RecordSet::from_columns([("name", vec![json!("Widget")])]).unwrap();
        let result = DataValidator::new().clean(&input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_clean_leaves_valid_rows_unchanged() {
        let input = RecordSet::from_columns([
            ("price", vec![json!(10.0), json!(0), json!(30.5)]),
            ("quantity", vec![json!(2), json!(3), json!(0)]),
        ])
        .unwrap();

        let transformed = Transformer::new().transform(&input).unwrap();
        let cleaned = DataValidator::new().clean(&transformed).unwrap();

        assert_eq!(cleaned, transformed);
        assert_eq!(cleaned.column("price"), input.column("price"));
        assert_eq!(cleaned.column("quantity"), input.column("quantity"));
    }

    #[test]
    fn test_clean_recomputes_total_for_clamped_rows() {
        let input = RecordSet::from_columns([
            ("price", vec![json!(10), json!(-5)]),
            ("quantity", vec![json!(2), json!(4)]),
        ])
        .unwrap();

        let transformed = Transformer::new().transform(&input).unwrap();
        assert_eq!(transformed.value(1, "total"), Some(&json!(-20)));

        let cleaned = DataValidator::new().clean(&transformed).unwrap();
        assert_eq!(cleaned.value(1, "price"), Some(&json!(0)));
        assert_eq!(cleaned.value(1, "total"), Some(&json!(0)));
        assert_eq!(cleaned.value(0, "total"), Some(&json!(20)));
    }

    #[test]
    fn test_clean_clamps_row_with_null_quantity() {
        let input = RecordSet::from_columns([
            ("price", vec![json!(-5)]),
            ("quantity", vec![Value::Null]),
            ("total", vec![json!(0)]),
        ])
        .unwrap();

        let cleaned = DataValidator::new().clean(&input).unwrap();
        assert_eq!(cleaned.value(0, "price"), Some(&json!(0)));
        assert_eq!(cleaned.value(0, "quantity"), Some(&Value::Null));
        assert_eq!(cleaned.value(0, "total"), Some(&Value::Null));
    }

    #[test]
    fn test_clean_nulls_total_it_cannot_derive() {
        let input = RecordSet::from_columns([
            ("price", vec![json!(-5), json!(4)]),
            ("quantity", vec![json!("n/a"), json!(2)]),
            ("total", vec![json!(-5), json!(8)]),
        ])
        .unwrap();

        let cleaned = DataValidator::new().clean(&input).unwrap();
        assert_eq!(cleaned.value(0, "price"), Some(&json!(0)));
        assert_eq!(cleaned.value(0, "total"), Some(&Value::Null));
        assert_eq!(cleaned.value(1, "total"), Some(&json!(8)));
    }
}
