//! Run table operations
//!
//! Runs are created once per unique `(subject_id, content_hash)` pair
//! and never updated or deleted afterwards.

use crate::record::RunRecord;
use chrono::{DateTime, NaiveDate, Utc};
use mdw_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// One subject's run-derived attributes, as projected for subject
/// derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRunAttrs {
    pub subject_id: i64,
    pub age_at_run: i64,
    pub sex: String,
    pub occurrence_date: NaiveDate,
}

/// Check whether a run with this content identity is already stored.
pub async fn run_exists(pool: &SqlitePool, subject_id: i64, content_hash: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM runs WHERE subject_id = ? AND content_hash = ?",
    )
    .bind(subject_id)
    .bind(content_hash)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Insert a new run row with the given pass-wide creation timestamp.
///
/// Committed individually: a later failure in the same pass leaves
/// this row durably stored.
pub async fn insert_run(
    pool: &SqlitePool,
    record: &RunRecord,
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO runs (subject_id, run_number, clinic_id, measurement,
                          occurrence_date, units, sample_rate, age_at_run, sex,
                          content_hash, raw_path, meta_path, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.subject_id)
    .bind(record.run_number)
    .bind(&record.clinic_id)
    .bind(&record.measurement)
    .bind(record.occurrence_date.to_string())
    .bind(&record.units)
    .bind(record.sample_rate)
    .bind(record.age_at_run)
    .bind(&record.sex)
    .bind(&record.content_hash)
    .bind(&record.raw_path)
    .bind(&record.meta_path)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Count total runs in the warehouse
pub async fn count_runs(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Project, for every subject with at least one stored run, the
/// attributes of that subject's deterministically chosen run.
///
/// This is a full re-scan of the runs table, which is what makes
/// subject derivation idempotent across passes and processes. The
/// chosen run is the one with the lowest content hash, so birth-year
/// and sex assignment stay deterministic even when a subject's runs
/// disagree on recorded age or sex.
pub async fn first_run_attrs_per_subject(pool: &SqlitePool) -> Result<Vec<SubjectRunAttrs>> {
    let rows = sqlx::query(
        r#"
        SELECT r.subject_id, r.age_at_run, r.sex, r.occurrence_date
        FROM runs r
        JOIN (
            SELECT subject_id, MIN(content_hash) AS first_hash
            FROM runs
            GROUP BY subject_id
        ) pick
          ON r.subject_id = pick.subject_id AND r.content_hash = pick.first_hash
        ORDER BY r.subject_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut attrs = Vec::new();
    for row in rows {
        let date_str: String = row.get("occurrence_date");
        let occurrence_date =
            NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                Error::InvalidInput(format!("stored occurrence_date '{date_str}': {e}"))
            })?;

        attrs.push(SubjectRunAttrs {
            subject_id: row.get("subject_id"),
            age_at_run: row.get("age_at_run"),
            sex: row.get("sex"),
            occurrence_date,
        });
    }

    Ok(attrs)
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

    fn record(subject_id: i64, content_hash: &str) -> RunRecord {
        RunRecord {
            subject_id,
            run_number: 1,
            clinic_id: "sf_state".to_string(),
            measurement: "ecg".to_string(),
            occurrence_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            units: "mV".to_string(),
            sample_rate: 500,
            age_at_run: 40,
            sex: "F".to_string(),
            content_hash: content_hash.to_string(),
            raw_path: format!("subject_{subject_id}/run_1.csv"),
            meta_path: format!("subject_{subject_id}/run_1_header.json"),
        }
    }

    #[tokio::test]
    async fn test_insert_then_exists() {
        let pool = setup_test_db().await;
        let rec = record(7, "aaaa");

        assert!(!run_exists(&pool, 7, "aaaa").await.unwrap());
        insert_run(&pool, &rec, Utc::now()).await.unwrap();
        assert!(run_exists(&pool, 7, "aaaa").await.unwrap());

        // Same hash under a different subject is a different identity
        assert!(!run_exists(&pool, 8, "aaaa").await.unwrap());
        assert_eq!(count_runs(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_projection_picks_lowest_hash_per_subject() {
        let pool = setup_test_db().await;

        let mut older = record(5, "bbbb");
        older.age_at_run = 60;
        let mut younger = record(5, "aaaa");
        younger.age_at_run = 59;
        insert_run(&pool, &older, Utc::now()).await.unwrap();
        insert_run(&pool, &younger, Utc::now()).await.unwrap();
        insert_run(&pool, &record(2, "cccc"), Utc::now()).await.unwrap();

        let attrs = first_run_attrs_per_subject(&pool).await.unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].subject_id, 2);
        assert_eq!(attrs[1].subject_id, 5);
        // Lowest content hash wins the tie-break
        assert_eq!(attrs[1].age_at_run, 59);
    }

    #[tokio::test]
    async fn test_projection_parses_stored_date() {
        let pool = setup_test_db().await;
        insert_run(&pool, &record(1, "aaaa"), Utc::now()).await.unwrap();

        let attrs = first_run_attrs_per_subject(&pool).await.unwrap();
        assert_eq!(
            attrs[0].occurrence_date,
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()
        );
    }
}
