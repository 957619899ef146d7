use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_sql_identifier, validate_storage_url};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::time::Duration;

/// One `(price, quantity, total)` row bound for the relational sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub price: Value,
    pub quantity: Value,
    pub total: Value,
}

/// SQLite-backed relational sink addressed by a connection string.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: String,
    busy_timeout: Duration,
}

impl SqliteSink {
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, a plain path, or `:memory:`.
    pub fn from_url(url: &str, busy_timeout: Duration) -> Result<Self> {
        validate_storage_url("storage_url", url)?;
        let trimmed = url.trim();
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);

        if path.is_empty() {
            return Err(EtlError::StorageUnconfigured);
        }

        Ok(Self {
            path: path.to_string(),
            busy_timeout,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Inserts every row inside one transaction. Returns the number of rows
    /// written; on any error nothing is committed.
    pub fn insert_batch(&self, table: &str, rows: &[SalesRow]) -> Result<usize> {
        validate_sql_identifier("table", table)?;

        let mut conn = self.open()?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                price REAL,
                quantity REAL,
                total REAL
            )"
        ))?;

        let mut written = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (price, quantity, total) VALUES (?1, ?2, ?3)"
            ))?;
            for row in rows {
                written += stmt.execute(params![
                    to_sql(&row.price),
                    to_sql(&row.quantity),
                    to_sql(&row.total)
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(table, rows = written, path = %self.path, "committed storage batch");
        Ok(written)
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(price: Value, quantity: Value, total: Value) -> SalesRow {
        SalesRow {
            price,
            quantity,
            total,
        }
    }

    #[test]
    fn test_from_url_variants() {
        let timeout = Duration::from_secs(1);
        assert_eq!(
            SqliteSink::from_url("sqlite:///tmp/a.db", timeout)
                .unwrap()
                .path(),
            "/tmp/a.db"
        );
        assert_eq!(
            SqliteSink::from_url("sqlite:b.db", timeout).unwrap().path(),
            "b.db"
        );
        assert_eq!(
            SqliteSink::from_url("c.db", timeout).unwrap().path(),
            "c.db"
        );
        assert!(matches!(
            SqliteSink::from_url("   ", timeout),
            Err(EtlError::StorageUnconfigured)
        ));
        assert!(matches!(
            SqliteSink::from_url("postgresql://etl@localhost/sales", timeout),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_created_table_accepts_null_cells() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sales.db");
        let sink =
            SqliteSink::from_url(db_path.to_str().unwrap(), Duration::from_secs(1)).unwrap();

        let rows = vec![
            row(json!(10), json!(2), json!(20)),
            row(Value::Null, json!(3), Value::Null),
        ];
        assert_eq!(sink.insert_batch("sales", &rows).unwrap(), 2);

        let conn = Connection::open(&db_path).unwrap();
        let (nulls, revenue): (i64, f64) = conn
            .query_row(
                "SELECT COUNT(*) - COUNT(total), SUM(total) FROM sales",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(nulls, 1);
        assert_eq!(revenue, 20.0);
    }

    #[test]
    fn test_insert_batch_commits_all_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sales.db");
        let sink =
            SqliteSink::from_url(db_path.to_str().unwrap(), Duration::from_secs(1)).unwrap();

        let rows = vec![
            row(json!(10.0), json!(2), json!(20.0)),
            row(json!(20.0), json!(3), json!(60.0)),
        ];
        assert_eq!(sink.insert_batch("sales", &rows).unwrap(), 2);

        let conn = Connection::open(&db_path).unwrap();
        let (count, revenue): (i64, f64) = conn
            .query_row("SELECT COUNT(*), SUM(total) FROM sales", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(revenue, 80.0);
    }

    #[test]
    fn test_insert_batch_rolls_back_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sales.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE sales (price REAL NOT NULL, quantity REAL NOT NULL, total REAL NOT NULL)",
        )
        .unwrap();

        let sink =
            SqliteSink::from_url(db_path.to_str().unwrap(), Duration::from_secs(1)).unwrap();
        let rows = vec![
            row(json!(10), json!(2), json!(20)),
            row(json!(5), Value::Null, json!(0)),
            row(json!(30), json!(1), json!(30)),
        ];

        let result = sink.insert_batch("sales", &rows);
        assert!(matches!(result, Err(EtlError::StorageWriteError(_))));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sales", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_insert_batch_binds_text_values_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sales.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch("CREATE TABLE sales (price, quantity, total)")
            .unwrap();

        let sink =
            SqliteSink::from_url(db_path.to_str().unwrap(), Duration::from_secs(1)).unwrap();
        let hostile = "1); DROP TABLE sales; --";
        sink.insert_batch("sales", &[row(json!(hostile), json!(1), json!(1))])
            .unwrap();

        let stored: String = conn
            .query_row("SELECT price FROM sales", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, hostile);
    }

    #[test]
    fn test_insert_batch_rejects_bad_table_name() {
        let sink = SqliteSink::from_url(":memory:", Duration::from_secs(1)).unwrap();
        let result = sink.insert_batch("sales; DROP TABLE x", &[]);
        assert!(matches!(
            result,
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }
}
