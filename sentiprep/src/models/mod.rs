//! Records and request types shared by services, the metadata store and the API

pub mod artifact;
pub mod dataset;
pub mod job;
pub mod requests;

pub use artifact::{artifact_path, Labeling, ModelArtifact, TrainedModel};
pub use dataset::{Dataset, DatasetStatus, SourceFile};
pub use job::{Job, JobError, JobKind, JobStatus};
pub use requests::{EvaluateRequest, LabelRequest, PredictInput, PredictRequest, TrainRequest};
