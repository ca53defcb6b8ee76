//! Job record persistence
//!
//! Job state is validated in memory by [`Job`]; the store simply keeps the
//! latest snapshot (last writer wins).

use sentiprep_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Job, JobKind, JobStatus};

fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid {}: {}", field, e)))
}

fn parse_time(value: Option<String>, field: &str) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    value
        .map(|v| {
            time::parse_rfc3339(&v).ok_or_else(|| Error::Internal(format!("Invalid {}: {}", field, v)))
        })
        .transpose()
}

fn from_row(row: &SqliteRow) -> Result<Job> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let model_id: Option<String> = row.get("model_id");
    let created_at: String = row.get("created_at");
    let result: Option<String> = row.get("result");

    Ok(Job {
        job_id: parse_uuid(&row.get::<String, _>("job_id"), "job_id")?,
        kind: JobKind::parse(&kind).ok_or_else(|| Error::Internal(format!("Unknown job kind: {}", kind)))?,
        dataset_id: parse_uuid(&row.get::<String, _>("dataset_id"), "dataset_id")?,
        session_id: parse_uuid(&row.get::<String, _>("session_id"), "session_id")?,
        model_id: model_id.map(|id| parse_uuid(&id, "model_id")).transpose()?,
        method: row.get("method"),
        status: JobStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown job status: {}", status)))?,
        progress: row.get::<i64, _>("progress").clamp(0, 100) as u8,
        message: row.get("message"),
        result_file: row.get("result_file"),
        result: result.map(|r| serde_json::from_str(&r)).transpose()?,
        created_at: parse_time(Some(created_at), "created_at")?
            .ok_or_else(|| Error::Internal("Missing created_at".to_string()))?,
        started_at: parse_time(row.get("started_at"), "started_at")?,
        finished_at: parse_time(row.get("finished_at"), "finished_at")?,
    })
}

/// Insert or overwrite the stored snapshot of `job`
pub async fn save_job(pool: &SqlitePool, job: &Job) -> Result<()> {
    let result = job.result.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        r#"
        INSERT INTO jobs (
            job_id, kind, dataset_id, session_id, model_id, method, status,
            progress, message, result_file, result, created_at, started_at, finished_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(job_id) DO UPDATE SET
            status = excluded.status,
            progress = excluded.progress,
            message = excluded.message,
            result_file = excluded.result_file,
            result = excluded.result,
            started_at = excluded.started_at,
            finished_at = excluded.finished_at
        "#,
    )
    .bind(job.job_id.to_string())
    .bind(job.kind.as_str())
    .bind(job.dataset_id.to_string())
    .bind(job.session_id.to_string())
    .bind(job.model_id.map(|id| id.to_string()))
    .bind(&job.method)
    .bind(job.status.as_str())
    .bind(job.progress as i64)
    .bind(&job.message)
    .bind(&job.result_file)
    .bind(result)
    .bind(job.created_at.to_rfc3339())
    .bind(job.started_at.map(|t| t.to_rfc3339()))
    .bind(job.finished_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_job(pool: &SqlitePool, job_id: Uuid) -> Result<Option<Job>> {
    let row = sqlx::query("SELECT * FROM jobs WHERE job_id = ?")
        .bind(job_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn list_dataset_jobs(pool: &SqlitePool, dataset_id: Uuid) -> Result<Vec<Job>> {
    let rows = sqlx::query("SELECT * FROM jobs WHERE dataset_id = ? ORDER BY created_at")
        .bind(dataset_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}
