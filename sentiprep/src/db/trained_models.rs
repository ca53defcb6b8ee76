//! Trained model records

use sentiprep_common::{time, Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::TrainedModel;

fn from_row(row: &SqliteRow) -> Result<TrainedModel> {
    let uuid = |field: &str| -> Result<Uuid> {
        let value: String = row.get(field);
        Uuid::parse_str(&value).map_err(|e| Error::Internal(format!("Invalid {}: {}", field, e)))
    };
    let hyperparameters: String = row.get("hyperparameters");
    let metrics: String = row.get("metrics");
    let created_at: String = row.get("created_at");

    Ok(TrainedModel {
        model_id: uuid("model_id")?,
        model_name: row.get("model_name"),
        session_id: uuid("session_id")?,
        dataset_id: uuid("dataset_id")?,
        algorithm: row.get("algorithm"),
        hyperparameters: serde_json::from_str(&hyperparameters)?,
        model_file: row.get("model_file"),
        train_size: row.get::<i64, _>("train_size").max(0) as usize,
        val_size: row.get::<i64, _>("val_size").max(0) as usize,
        metrics: serde_json::from_str(&metrics)?,
        created_at: time::parse_rfc3339(&created_at)
            .ok_or_else(|| Error::Internal(format!("Invalid created_at: {}", created_at)))?,
    })
}

pub async fn insert_trained_model(pool: &SqlitePool, model: &TrainedModel) -> Result<()> {
    let hyperparameters = serde_json::to_string(&model.hyperparameters)?;
    let metrics = serde_json::to_string(&model.metrics)?;

    sqlx::query(
        r#"
        INSERT INTO trained_models (
            model_id, model_name, session_id, dataset_id, algorithm, hyperparameters,
            model_file, train_size, val_size, metrics, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(model.model_id.to_string())
    .bind(&model.model_name)
    .bind(model.session_id.to_string())
    .bind(model.dataset_id.to_string())
    .bind(&model.algorithm)
    .bind(hyperparameters)
    .bind(&model.model_file)
    .bind(model.train_size as i64)
    .bind(model.val_size as i64)
    .bind(metrics)
    .bind(model.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_trained_model(pool: &SqlitePool, model_id: Uuid) -> Result<Option<TrainedModel>> {
    let row = sqlx::query("SELECT * FROM trained_models WHERE model_id = ?")
        .bind(model_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn list_session_models(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<TrainedModel>> {
    let rows = sqlx::query("SELECT * FROM trained_models WHERE session_id = ? ORDER BY created_at")
        .bind(session_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(from_row).collect()
}
