//! Database initialization
//!
//! Opens (creating if needed) the warehouse database and idempotently
//! ensures the run and subject tables exist. Safe to call on every
//! startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
///
/// The warehouse assumes a single exclusive writer, so the pool holds
/// exactly one connection.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new warehouse database: {}", db_path.display());
    } else {
        info!("Opened existing warehouse database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL keeps readers (reporting queries) unblocked during a pass
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Idempotently ensure the run and subject tables exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_runs_table(pool).await?;
    create_subjects_table(pool).await?;
    Ok(())
}

/// Create the runs table (idempotent)
///
/// Identity of a stored run is `(subject_id, content_hash)`; the
/// UNIQUE constraint enforces the no-duplicate invariant at the
/// storage layer as well as in the engine's existence check.
/// `run_number` is clinic-supplied and informational only.
pub async fn create_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_id INTEGER NOT NULL,
            run_number INTEGER NOT NULL,
            clinic_id TEXT NOT NULL,
            measurement TEXT NOT NULL,
            occurrence_date TEXT NOT NULL,
            units TEXT NOT NULL,
            sample_rate INTEGER NOT NULL,
            age_at_run INTEGER NOT NULL,
            sex TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            raw_path TEXT NOT NULL,
            meta_path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(subject_id, content_hash)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the subjects table (idempotent)
pub async fn create_subjects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            subject_id INTEGER PRIMARY KEY,
            sex TEXT NOT NULL,
            birth_year INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Irreversibly destroy all stored warehouse state
pub async fn drop_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS runs").execute(pool).await?;
    sqlx::query("DROP TABLE IF EXISTS subjects").execute(pool).await?;
    info!("Dropped all warehouse tables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        create_schema(&pool).await.expect("First create failed");
        create_schema(&pool).await.expect("Repeat create failed");

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('runs', 'subjects')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_drop_all_then_create_yields_empty_store() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        create_schema(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO subjects (subject_id, sex, birth_year, created_at) VALUES (1, 'M', 1970, '2020-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        drop_all(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();

        let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs")
            .fetch_one(&pool)
            .await
            .unwrap();
        let subjects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(runs, 0);
        assert_eq!(subjects, 0);
    }

    #[tokio::test]
    async fn test_unique_constraint_on_subject_and_hash() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_schema(&pool).await.unwrap();

        let insert = r#"
            INSERT INTO runs (subject_id, run_number, clinic_id, measurement,
                              occurrence_date, units, sample_rate, age_at_run, sex,
                              content_hash, raw_path, meta_path, created_at)
            VALUES (7, 1, 'sf_state', 'ecg', '2020-01-01', 'mV', 500, 40, 'F',
                    'aaaa', 'a.csv', 'a.json', '2020-01-01T00:00:00Z')
        "#;
        sqlx::query(insert).execute(&pool).await.unwrap();
        let dup = sqlx::query(insert).execute(&pool).await;
        assert!(dup.is_err(), "Duplicate (subject_id, content_hash) must be rejected");
    }
}
