//! Dataset records

use chrono::{DateTime, Utc};
use sentiprep_common::time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Lifecycle marker shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetStatus {
    Uploaded,
    Cleaned,
    CleaningFailed,
    Labeled,
    LabelingFailed,
    Trained,
    TrainingFailed,
}

impl DatasetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStatus::Uploaded => "Uploaded",
            DatasetStatus::Cleaned => "Cleaned",
            DatasetStatus::CleaningFailed => "CleaningFailed",
            DatasetStatus::Labeled => "Labeled",
            DatasetStatus::LabelingFailed => "LabelingFailed",
            DatasetStatus::Trained => "Trained",
            DatasetStatus::TrainingFailed => "TrainingFailed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [
            DatasetStatus::Uploaded,
            DatasetStatus::Cleaned,
            DatasetStatus::CleaningFailed,
            DatasetStatus::Labeled,
            DatasetStatus::LabelingFailed,
            DatasetStatus::Trained,
            DatasetStatus::TrainingFailed,
        ]
        .into_iter()
        .find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dataset_id: Uuid,
    pub session_id: Uuid,
    /// Object path of the uploaded file (has a header row)
    pub original_file: String,
    /// Object path of the cleaned file (headerless)
    pub cleaned_file: Option<String>,
    /// Object path of the labeled file (headerless, target in column 0)
    pub labeled_file: Option<String>,
    /// Names of the columns kept by the last cleaning run
    pub cleaned_columns: Option<BTreeMap<usize, String>>,
    pub status: DatasetStatus,
    pub created_at: DateTime<Utc>,
}

/// Which stored file a stage reads, and whether it has a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub has_header: bool,
}

impl Dataset {
    pub fn new(session_id: Uuid, original_file: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), session_id, original_file)
    }

    pub fn with_id(dataset_id: Uuid, session_id: Uuid, original_file: impl Into<String>) -> Self {
        Self {
            dataset_id,
            session_id,
            original_file: original_file.into(),
            cleaned_file: None,
            labeled_file: None,
            cleaned_columns: None,
            status: DatasetStatus::Uploaded,
            created_at: time::now(),
        }
    }

    pub fn original_source(&self) -> SourceFile {
        SourceFile {
            path: self.original_file.clone(),
            has_header: true,
        }
    }

    /// Labeling input: cleaned file, else the original
    pub fn labeling_source(&self) -> SourceFile {
        match &self.cleaned_file {
            Some(path) => SourceFile {
                path: path.clone(),
                has_header: false,
            },
            None => self.original_source(),
        }
    }

    /// Training input: labeled file, else cleaned, else the original
    pub fn training_source(&self) -> SourceFile {
        match &self.labeled_file {
            Some(path) => SourceFile {
                path: path.clone(),
                has_header: false,
            },
            None => self.labeling_source(),
        }
    }
}
