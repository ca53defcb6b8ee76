//! Dataset record queries

use sentiprep_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{Dataset, DatasetStatus};

fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid {}: {}", field, e)))
}

fn from_row(row: &SqliteRow) -> Result<Dataset> {
    let status: String = row.get("status");
    let status = DatasetStatus::parse(&status)
        .ok_or_else(|| Error::Internal(format!("Unknown dataset status: {}", status)))?;

    let cleaned_columns: Option<String> = row.get("cleaned_columns");
    let cleaned_columns = cleaned_columns
        .map(|text| serde_json::from_str::<BTreeMap<usize, String>>(&text))
        .transpose()?;

    let created_at: String = row.get("created_at");
    let created_at = time::parse_rfc3339(&created_at)
        .ok_or_else(|| Error::Internal(format!("Invalid created_at: {}", created_at)))?;

    Ok(Dataset {
        dataset_id: parse_uuid(&row.get::<String, _>("dataset_id"), "dataset_id")?,
        session_id: parse_uuid(&row.get::<String, _>("session_id"), "session_id")?,
        original_file: row.get("original_file"),
        cleaned_file: row.get("cleaned_file"),
        labeled_file: row.get("labeled_file"),
        cleaned_columns,
        status,
        created_at,
    })
}

pub async fn insert_dataset(pool: &SqlitePool, dataset: &Dataset) -> Result<()> {
    let cleaned_columns = dataset
        .cleaned_columns
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO datasets (
            dataset_id, session_id, original_file, cleaned_file, labeled_file,
            cleaned_columns, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(dataset.dataset_id.to_string())
    .bind(dataset.session_id.to_string())
    .bind(&dataset.original_file)
    .bind(&dataset.cleaned_file)
    .bind(&dataset.labeled_file)
    .bind(cleaned_columns)
    .bind(dataset.status.as_str())
    .bind(dataset.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_dataset(pool: &SqlitePool, dataset_id: Uuid) -> Result<Option<Dataset>> {
    let row = sqlx::query("SELECT * FROM datasets WHERE dataset_id = ?")
        .bind(dataset_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn list_session_datasets(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<Dataset>> {
    let rows = sqlx::query("SELECT * FROM datasets WHERE session_id = ? ORDER BY created_at")
        .bind(session_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}

/// Record a successful cleaning run
pub async fn set_cleaned(
    pool: &SqlitePool,
    dataset_id: Uuid,
    cleaned_file: &str,
    cleaned_columns: Option<&BTreeMap<usize, String>>,
) -> Result<()> {
    let cleaned_columns = cleaned_columns.map(serde_json::to_string).transpose()?;
    sqlx::query(
        "UPDATE datasets SET cleaned_file = ?, cleaned_columns = ?, status = ? WHERE dataset_id = ?",
    )
    .bind(cleaned_file)
    .bind(cleaned_columns)
    .bind(DatasetStatus::Cleaned.as_str())
    .bind(dataset_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Point the dataset at a new labeled file
///
/// Runs on a pool or inside a transaction.
pub async fn set_labeled<'e, E>(executor: E, dataset_id: Uuid, labeled_file: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE datasets SET labeled_file = ?, status = ? WHERE dataset_id = ?")
        .bind(labeled_file)
        .bind(DatasetStatus::Labeled.as_str())
        .bind(dataset_id.to_string())
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_status(pool: &SqlitePool, dataset_id: Uuid, status: DatasetStatus) -> Result<()> {
    sqlx::query("UPDATE datasets SET status = ? WHERE dataset_id = ?")
        .bind(status.as_str())
        .bind(dataset_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
