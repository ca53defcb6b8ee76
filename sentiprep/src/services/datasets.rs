//! Dataset upload

use super::{ServiceError, ServiceResult};
use crate::db;
use crate::models::Dataset;
use crate::table::read_csv;
use crate::AppState;
use tracing::info;
use uuid::Uuid;

/// Object path of an uploaded file
pub fn raw_path(dataset_id: Uuid) -> String {
    format!("raw/{}.csv", dataset_id)
}

/// Store an uploaded CSV (with header row) and register the dataset
pub async fn upload_dataset(state: &AppState, session_id: Uuid, bytes: Vec<u8>) -> ServiceResult<Dataset> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ServiceError::InvalidInput("Uploaded file is empty".to_string()));
    }
    let (bytes, table) = tokio::task::spawn_blocking(move || {
        let table = read_csv(&bytes, true, None);
        (bytes, table)
    })
    .await?;
    let table = table?;

    let dataset_id = Uuid::new_v4();
    let dataset = Dataset::with_id(dataset_id, session_id, raw_path(dataset_id));
    state.store.upload(&dataset.original_file, bytes).await?;
    db::datasets::insert_dataset(&state.db, &dataset).await?;

    info!(
        dataset_id = %dataset.dataset_id,
        session_id = %session_id,
        rows = table.len(),
        columns = table.width(),
        "Dataset uploaded"
    );
    Ok(dataset)
}

pub async fn get_dataset(state: &AppState, dataset_id: Uuid) -> ServiceResult<Dataset> {
    super::load_dataset(state, dataset_id).await
}
