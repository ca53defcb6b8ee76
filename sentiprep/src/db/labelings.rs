//! Labeling summary records

use sentiprep_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::Labeling;

fn from_row(row: &SqliteRow) -> Result<Labeling> {
    let uuid = |field: &str| -> Result<Uuid> {
        let value: String = row.get(field);
        Uuid::parse_str(&value).map_err(|e| Error::Internal(format!("Invalid {}: {}", field, e)))
    };
    let hyperparameters: String = row.get("hyperparameters");
    let summary: String = row.get("summary");
    let created_at: String = row.get("created_at");

    Ok(Labeling {
        labeling_id: uuid("labeling_id")?,
        dataset_id: uuid("dataset_id")?,
        session_id: uuid("session_id")?,
        method: row.get("method"),
        hyperparameters: serde_json::from_str(&hyperparameters)?,
        summary: serde_json::from_str(&summary)?,
        labeled_file: row.get("labeled_file"),
        created_at: time::parse_rfc3339(&created_at)
            .ok_or_else(|| Error::Internal(format!("Invalid created_at: {}", created_at)))?,
    })
}

pub async fn insert_labeling<'e, E>(executor: E, labeling: &Labeling) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let hyperparameters = serde_json::to_string(&labeling.hyperparameters)?;
    let summary = serde_json::to_string(&labeling.summary)?;

    sqlx::query(
        r#"
        INSERT INTO labelings (
            labeling_id, dataset_id, session_id, method, hyperparameters,
            summary, labeled_file, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(labeling.labeling_id.to_string())
    .bind(labeling.dataset_id.to_string())
    .bind(labeling.session_id.to_string())
    .bind(&labeling.method)
    .bind(hyperparameters)
    .bind(summary)
    .bind(&labeling.labeled_file)
    .bind(labeling.created_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Store a labeling record and make its file the dataset's labeled file
///
/// Both writes commit together or not at all.
pub async fn record_labeling(pool: &SqlitePool, labeling: &Labeling) -> Result<()> {
    let mut tx = pool.begin().await?;
    insert_labeling(&mut *tx, labeling).await?;
    super::datasets::set_labeled(&mut *tx, labeling.dataset_id, &labeling.labeled_file).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn list_dataset_labelings(pool: &SqlitePool, dataset_id: Uuid) -> Result<Vec<Labeling>> {
    let rows = sqlx::query("SELECT * FROM labelings WHERE dataset_id = ? ORDER BY created_at")
        .bind(dataset_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}
