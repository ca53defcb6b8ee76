//! Integration tests for the job runners and model services
//!
//! Each test runs against an in-memory metadata store and a temporary object
//! store directory.

use std::sync::Arc;

use sentiprep::classifiers::ModelError;
use sentiprep::cleaning::CleaningOptions;
use sentiprep::labeling::{Annotation, KeywordMap};
use sentiprep::models::{DatasetStatus, JobStatus, LabelRequest, TrainRequest};
use sentiprep::services::{self, FsObjectStore, ObjectStore, ServiceError};
use sentiprep::AppState;
use sentiprep_common::config::KeywordConfig;
use uuid::Uuid;

const REVIEWS: &str = "id,text
101,I love pizza so much
102,I hate pizza so much
103,I love pasta so much
104,I hate pasta so much
105,I love salad so much
106,I hate salad so much
107,I love soup so much
108,I hate soup so much
109,I love bread so much
110,I hate bread so much
111,I love cheese so much
112,I hate cheese so much
101,I love pizza so much
";

async fn create_test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = sentiprep_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let state = AppState::new(pool, Arc::new(FsObjectStore::new(dir.path())));
    (state, dir)
}

async fn store_default_keywords(state: &AppState) {
    let config = KeywordConfig::default();
    state.store.upload(&config.positives, b"Love, great".to_vec()).await.unwrap();
    state.store.upload(&config.negatives, b"hate ,awful".to_vec()).await.unwrap();
}

fn keyword_map() -> KeywordMap {
    let mut map = KeywordMap::new();
    map.insert("positive".into(), vec!["love".into()]);
    map.insert("negative".into(), vec!["hate".into()]);
    map
}

#[tokio::test]
async fn test_clean_label_train_predict_evaluate() {
    let (state, _dir) = create_test_state().await;
    let session_id = Uuid::new_v4();
    let dataset = services::upload_dataset(&state, session_id, REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(dataset.status, DatasetStatus::Uploaded);

    // clean
    let job = services::submit_clean_job(&state, dataset.dataset_id, CleaningOptions::default())
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);
    let result = job.result.unwrap();
    assert_eq!(result["duplicate_rows"], 1);
    assert_eq!(result["final_rows"], 12);
    let dataset = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(dataset.status, DatasetStatus::Cleaned);
    assert!(dataset.cleaned_file.is_some());

    // label with the stored default keyword lists
    store_default_keywords(&state).await;
    let job = services::submit_label_job(&state, dataset.dataset_id, LabelRequest::Naive { keywords: None })
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);
    assert_eq!(job.result.as_ref().unwrap()["labeled"], 12);
    let dataset = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(dataset.status, DatasetStatus::Labeled);

    let labeled = state
        .store
        .download(dataset.labeled_file.as_deref().unwrap())
        .await
        .unwrap();
    let labeled = String::from_utf8(labeled).unwrap();
    assert!(labeled.starts_with("4,101,I love pizza so much"));

    // train
    let mut request = TrainRequest::new("naive_bayes");
    request.test_size = 0.25;
    let handle = services::submit_train_job(&state, dataset.dataset_id, request)
        .await
        .unwrap();
    let model_id = handle.job.model_id.unwrap();
    let job = handle.wait().await.unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);
    assert_eq!(job.result.as_ref().unwrap()["val_size"], 3);

    let record = services::evaluate_model(&state, model_id).await.unwrap();
    assert_eq!(record.algorithm, "naive_bayes");
    assert_eq!(record.model_name, "naive_bayes_model");
    assert_eq!(record.train_size + record.val_size, 12);

    // predict
    assert_eq!(
        services::predict_one(&state, model_id, "love it".into()).await.unwrap(),
        4
    );
    assert_eq!(
        services::predict_many(&state, model_id, vec!["I hate mondays".into(), "love".into()])
            .await
            .unwrap(),
        vec![0, 4]
    );
    let predictions = services::predict_dataset(&state, model_id, dataset.dataset_id)
        .await
        .unwrap();
    assert_eq!(predictions.text_column, 1);
    assert_eq!(predictions.predictions.len(), 13);
    assert_eq!(&predictions.predictions[..2], &[4, 0]);

    // evaluate
    let report = services::evaluate_on_dataset(&state, model_id, dataset.dataset_id)
        .await
        .unwrap();
    assert_eq!(report.rows, 12);
    assert_eq!(report.labels, vec![0, 4]);
    assert_eq!(report.accuracy, 1.0);
    assert_eq!(report.confusion_matrix, vec![vec![6, 0], vec![0, 6]]);
}

#[tokio::test]
async fn test_manual_labels_then_naive_automatic_model() {
    let (state, _dir) = create_test_state().await;
    store_default_keywords(&state).await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();

    let annotations: Vec<Annotation> = (0..12)
        .map(|row_index| Annotation {
            row_index,
            label: if row_index % 2 == 0 { 4 } else { 0 },
        })
        .collect();
    let job = services::submit_label_job(
        &state,
        dataset.dataset_id,
        LabelRequest::Manual {
            annotations,
            stop_early: true,
        },
    )
    .await
    .unwrap()
    .wait()
    .await
    .unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);
    assert_eq!(job.result.as_ref().unwrap()["total_rows"], 12);

    let handle = services::submit_train_job(&state, dataset.dataset_id, TrainRequest::new("naive_automatic"))
        .await
        .unwrap();
    let model_id = handle.job.model_id.unwrap();
    let job = handle.wait().await.unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);

    let model = services::load_model(&state, model_id).await.unwrap();
    assert_eq!(model.artifact.hyperparameters["positives"][0], "love");
    assert_eq!(
        services::predict_many(
            &state,
            model_id,
            vec!["great day".into(), "awful day".into(), "plain day".into()]
        )
        .await
        .unwrap(),
        vec![4, 0, 2]
    );
}

#[tokio::test]
async fn test_cluster_labeling_records_summary() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();

    let request: LabelRequest = serde_json::from_value(serde_json::json!({
        "method": "clustering",
        "algorithm": "hierarchical",
        "hyperparameters": {"n_clusters": 2}
    }))
    .unwrap();
    let job = services::submit_label_job(&state, dataset.dataset_id, request)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);

    let labelings = sentiprep::db::labelings::list_dataset_labelings(&state.db, dataset.dataset_id)
        .await
        .unwrap();
    assert_eq!(labelings.len(), 1);
    assert_eq!(labelings[0].method, "clustering");
    assert_eq!(job.result.as_ref().unwrap()["clusters"], 2);
}

#[tokio::test]
async fn test_input_errors_create_no_job() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();

    let err = services::submit_train_job(&state, dataset.dataset_id, TrainRequest::new("forest"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Model(ModelError::UnknownAlgorithm(_))));
    assert!(err.is_input_error());

    let mut empty = KeywordMap::new();
    empty.insert("pos".into(), Vec::new());
    let err = services::submit_label_job(&state, dataset.dataset_id, LabelRequest::Naive { keywords: Some(empty) })
        .await
        .unwrap_err();
    assert!(err.is_input_error());

    let err = services::submit_clean_job(&state, Uuid::new_v4(), CleaningOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let jobs = sentiprep::db::jobs::list_dataset_jobs(&state.db, dataset.dataset_id)
        .await
        .unwrap();
    assert!(jobs.is_empty());

    let err = services::upload_dataset(&state, Uuid::new_v4(), b"  \n".to_vec())
        .await
        .unwrap_err();
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_stage_errors_fail_the_job() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();

    // no keyword lists in the store
    let job = services::submit_label_job(&state, dataset.dataset_id, LabelRequest::Naive { keywords: None })
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("keywords"), "{}", job.message);
    let stored = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(stored.status, DatasetStatus::LabelingFailed);
    assert!(stored.labeled_file.is_none());

    // nothing labeled yet
    let job = services::submit_train_job(&state, dataset.dataset_id, TrainRequest::new("knn"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let stored = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(stored.status, DatasetStatus::TrainingFailed);

    let polled = services::get_job(&state, job.job_id).await.unwrap();
    assert_eq!(polled.status, JobStatus::Failed);
    assert_eq!(polled.message, job.message);
}

#[tokio::test]
async fn test_custom_keywords_label_end_to_end() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(
        &state,
        Uuid::new_v4(),
        b"text\nI love this\nI hate this\n".to_vec(),
    )
    .await
    .unwrap();

    let job = services::submit_label_job(
        &state,
        dataset.dataset_id,
        LabelRequest::Naive {
            keywords: Some(keyword_map()),
        },
    )
    .await
    .unwrap()
    .wait()
    .await
    .unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{}", job.message);

    let bytes = state.store.download(&job.result_file.unwrap()).await.unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "4,I love this\n0,I hate this\n");
}

/// Make SQLite reject any update that repoints `column` of a dataset
async fn refuse_file_updates(state: &AppState, column: &str) {
    let sql = format!(
        "CREATE TRIGGER refuse_{column} BEFORE UPDATE OF {column} ON datasets \
         BEGIN SELECT RAISE(ABORT, '{column} update refused'); END"
    );
    sqlx::query(&sql).execute(&state.db).await.unwrap();
}

#[tokio::test]
async fn test_failed_reclean_keeps_current_cleaned_file() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();

    let first = services::submit_clean_job(&state, dataset.dataset_id, CleaningOptions::default())
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(first.status, JobStatus::Completed, "{}", first.message);
    let current = services::get_dataset(&state, dataset.dataset_id)
        .await
        .unwrap()
        .cleaned_file
        .unwrap();
    assert_eq!(first.result_file.as_deref(), Some(current.as_str()));

    refuse_file_updates(&state, "cleaned_file").await;
    let second = services::submit_clean_job(&state, dataset.dataset_id, CleaningOptions::default())
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(second.status, JobStatus::Failed);
    assert!(second.message.contains("refused"), "{}", second.message);
    assert!(second.result_file.is_none());

    let stored = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(stored.status, DatasetStatus::CleaningFailed);
    assert_eq!(stored.cleaned_file.as_deref(), Some(current.as_str()));
    assert!(state.store.download(&current).await.is_ok());

    let discarded = services::clean::cleaned_path(dataset.dataset_id, second.job_id);
    assert_ne!(discarded, current);
    assert!(state.store.download(&discarded).await.is_err());
}

#[tokio::test]
async fn test_failed_relabel_leaves_no_orphan_labeling() {
    let (state, _dir) = create_test_state().await;
    let dataset = services::upload_dataset(&state, Uuid::new_v4(), REVIEWS.as_bytes().to_vec())
        .await
        .unwrap();
    let request = || LabelRequest::Naive {
        keywords: Some(keyword_map()),
    };

    let first = services::submit_label_job(&state, dataset.dataset_id, request())
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(first.status, JobStatus::Completed, "{}", first.message);
    let current = services::get_dataset(&state, dataset.dataset_id)
        .await
        .unwrap()
        .labeled_file
        .unwrap();

    refuse_file_updates(&state, "labeled_file").await;
    let second = services::submit_label_job(&state, dataset.dataset_id, request())
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(second.status, JobStatus::Failed);
    assert!(second.message.contains("refused"), "{}", second.message);

    // the labeling insert rolled back with the dataset update
    let labelings = sentiprep::db::labelings::list_dataset_labelings(&state.db, dataset.dataset_id)
        .await
        .unwrap();
    assert_eq!(labelings.len(), 1);
    assert_eq!(labelings[0].labeled_file, current);

    let stored = services::get_dataset(&state, dataset.dataset_id).await.unwrap();
    assert_eq!(stored.status, DatasetStatus::LabelingFailed);
    assert_eq!(stored.labeled_file.as_deref(), Some(current.as_str()));
    assert!(state.store.download(&current).await.is_ok());
    let discarded = services::label::labeled_path(dataset.dataset_id, second.job_id);
    assert!(state.store.download(&discarded).await.is_err());
}
