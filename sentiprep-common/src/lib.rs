//! # Sentiprep Common Library
//!
//! Shared code for the sentiment dataset preparation service:
//! - Error type shared by the metadata store and the service crate
//! - Bootstrap configuration loading and root folder resolution
//! - SQLite metadata store initialization
//! - Timestamp helpers

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
