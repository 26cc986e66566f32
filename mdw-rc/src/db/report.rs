//! Read-only reporting escape hatch
//!
//! Runs an arbitrary SELECT against the warehouse and renders the
//! result as text columns. Never used by the reconciliation engine
//! itself.

use mdw_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};

/// A tabular query result rendered to strings
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Run a read-only reporting query.
///
/// Only SELECT statements are accepted; the warehouse's write path is
/// the reconciliation engine alone.
pub async fn run_query(pool: &SqlitePool, sql: &str) -> Result<QueryResult> {
    if !sql.trim_start().to_ascii_lowercase().starts_with("select") {
        return Err(Error::InvalidInput(
            "reporting queries must be SELECT statements".to_string(),
        ));
    }

    let rows = sqlx::query(sql).fetch_all(pool).await?;

    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rendered = rows
        .iter()
        .map(|row| {
            (0..row.columns().len())
                .map(|idx| render_value(row, idx))
                .collect()
        })
        .collect();

    Ok(QueryResult {
        columns,
        rows: rendered,
    })
}

/// Render one cell as text, whatever SQLite's dynamic type turned out
/// to be.
fn render_value(row: &SqliteRow, idx: usize) -> String {
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(idx) {
        return value.unwrap_or_else(|| "NULL".to_string());
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return value.map_or_else(
            || "NULL".to_string(),
            |bytes| format!("<{} bytes>", bytes.len()),
        );
    }
    "?".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        mdw_common::db::init::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_select_renders_columns_and_rows() {
        let pool = setup_test_db().await;
        sqlx::query(
            "INSERT INTO subjects (subject_id, sex, birth_year, created_at) VALUES (3, 'F', 1971, '2020-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = run_query(&pool, "SELECT subject_id, sex, birth_year FROM subjects")
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["subject_id", "sex", "birth_year"]);
        assert_eq!(result.rows, vec![vec!["3", "F", "1971"]]);
    }

    #[tokio::test]
    async fn test_non_select_rejected() {
        let pool = setup_test_db().await;
        let err = run_query(&pool, "DELETE FROM subjects").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_result_is_empty() {
        let pool = setup_test_db().await;
        let result = run_query(&pool, "SELECT * FROM runs").await.unwrap();
        assert!(result.rows.is_empty());
    }
}
