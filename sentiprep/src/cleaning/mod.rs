//! Dataset cleaning
//!
//! Turns raw uploaded rows into a trainable table: column validation,
//! duplicate removal, text normalization, missing-value handling and column
//! projection, in that order.

pub mod language;
pub mod metrics;
pub mod missing;
pub mod normalizer;
pub mod options;
pub mod pipeline;
pub mod validator;

pub use language::{Language, LanguageDetector};
pub use metrics::CleaningMetrics;
pub use normalizer::TextNormalizer;
pub use options::{
    CleaningOptions, ColumnValidationRule, MissingStrategy, MissingValueRule, TextCleaningRule,
    ValidationCheck,
};
pub use pipeline::{CleaningPipeline, CleaningReport};
pub use validator::RowValidator;

use crate::table::TableError;
use thiserror::Error;

/// Errors raised by a cleaning stage
#[derive(Debug, Error)]
pub enum CleaningError {
    /// A rule names a column the table does not have
    #[error("Column {0} does not exist in the dataset")]
    MissingColumn(usize),

    #[error(transparent)]
    Table(#[from] TableError),
}
