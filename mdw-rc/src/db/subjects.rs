//! Subject table operations
//!
//! A subject row is materialized once, lazily, when any reconciled run
//! first references its subject number. Derived fields are fixed at
//! creation and never reconciled against later runs (known limitation
//! of the warehouse, preserved deliberately).

use chrono::{DateTime, Utc};
use mdw_common::Result;
use sqlx::{Row, SqlitePool};

/// One materialized subject row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub subject_id: i64,
    pub sex: String,
    pub birth_year: i64,
}

/// Check whether a subject is already materialized.
pub async fn subject_exists(pool: &SqlitePool, subject_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE subject_id = ?")
        .bind(subject_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Insert a new subject row with the given pass-wide creation timestamp.
pub async fn insert_subject(
    pool: &SqlitePool,
    record: &SubjectRecord,
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO subjects (subject_id, sex, birth_year, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(record.subject_id)
    .bind(&record.sex)
    .bind(record.birth_year)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Count total subjects in the warehouse
pub async fn count_subjects(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Load one subject row, if materialized.
pub async fn load_subject(pool: &SqlitePool, subject_id: i64) -> Result<Option<SubjectRecord>> {
    let row = sqlx::query("SELECT subject_id, sex, birth_year FROM subjects WHERE subject_id = ?")
        .bind(subject_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| SubjectRecord {
        subject_id: row.get("subject_id"),
        sex: row.get("sex"),
        birth_year: row.get("birth_year"),
    }))
}
