use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Column-ordered table of rows; every row holds one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a record set from uniquely named columns of equal length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Vec<Value>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();

        if let Some(pos) = (1..names.len()).find(|&i| names[..i].contains(&names[i])) {
            return Err(EtlError::ProcessingError {
                message: format!("duplicate column '{}'", names[pos]),
            });
        }

        let row_count = values.first().map(Vec::len).unwrap_or(0);
        if let Some(pos) = values.iter().position(|column| column.len() != row_count) {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "column '{}' has {} values, expected {}",
                    names[pos],
                    values[pos].len(),
                    row_count
                ),
            });
        }

        let mut set = Self::new(names);
        for i in 0..row_count {
            set.rows
                .push(values.iter().map(|column| column[i].clone()).collect());
        }
        Ok(set)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "row has {} cells, expected {}",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// The subset of `required` that this record set lacks, in request order.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Numeric view of a column. Nulls are skipped; any other non-number fails.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| EtlError::ValidationFailure {
                message: format!("missing column '{}'", name),
            })?;

        let mut out = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            match &row[idx] {
                Value::Null => {}
                Value::Number(n) => out.push(n.as_f64().unwrap_or(f64::NAN)),
                other => {
                    return Err(EtlError::ValidationFailure {
                        message: format!(
                            "non-numeric value {} in column '{}' at row {}",
                            other, name, i
                        ),
                    })
                }
            }
        }
        Ok(out)
    }

    /// Writes `values` into `name`, appending the column if it is new.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    self.rows.len()
                ),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Broadcasts one value to every row of `name`.
    pub fn fill_column(&mut self, name: &str, value: Value) -> Result<()> {
        let values = vec![value; self.rows.len()];
        self.set_column(name, values)
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn category(&self) -> Option<DataCategory> {
        self.value(0, "category")
            .and_then(Value::as_str)
            .and_then(DataCategory::parse)
    }

    pub fn is_premium(&self) -> Option<bool> {
        self.value(0, "premium").and_then(Value::as_bool)
    }

    /// `None` when the set had no discount column to flag.
    pub fn is_discounted(&self) -> Option<bool> {
        self.value(0, "discounted").and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    High,
    Low,
}

impl DataCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::High => "high",
            DataCategory::Low => "low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "high" => Some(DataCategory::High),
            "low" => Some(DataCategory::Low),
            _ => None,
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_revenue: f64,
    pub total_items: f64,
    pub avg_price: f64,
    pub record_count: usize,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total_revenue={} total_items={} avg_price={:.2} record_count={}",
            self.total_revenue, self.total_items, self.avg_price, self.record_count
        )
    }
}
