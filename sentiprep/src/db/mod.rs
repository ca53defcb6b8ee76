//! Metadata store queries
//!
//! Schema creation lives in `sentiprep_common::db`; these modules read and
//! write individual records.

pub mod datasets;
pub mod jobs;
pub mod labelings;
pub mod trained_models;
