//! Database initialization
//!
//! Creates the metadata tables on first run. Every statement is idempotent so
//! opening an existing store is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (or create) the metadata store at `db_path` and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets job status polling read while a job writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory store with the full schema (single connection so all handles share it)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all metadata tables if they don't exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_datasets_table(pool).await?;
    create_jobs_table(pool).await?;
    create_labelings_table(pool).await?;
    create_trained_models_table(pool).await?;
    Ok(())
}

async fn create_datasets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            dataset_id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            original_file TEXT NOT NULL,
            cleaned_file TEXT,
            labeled_file TEXT,
            cleaned_columns TEXT,
            status TEXT NOT NULL DEFAULT 'Uploaded',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_datasets_session ON datasets(session_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_jobs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            job_id TEXT PRIMARY KEY,
            kind TEXT NOT NULL CHECK (kind IN ('clean', 'label', 'train')),
            dataset_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            model_id TEXT,
            method TEXT,
            status TEXT NOT NULL CHECK (status IN ('queued', 'running', 'completed', 'failed')),
            progress INTEGER NOT NULL DEFAULT 0,
            message TEXT NOT NULL DEFAULT '',
            result_file TEXT,
            result TEXT,
            created_at TEXT NOT NULL,
            started_at TEXT,
            finished_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_labelings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS labelings (
            labeling_id TEXT PRIMARY KEY,
            dataset_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            method TEXT NOT NULL,
            hyperparameters TEXT NOT NULL DEFAULT '{}',
            summary TEXT NOT NULL DEFAULT '{}',
            labeled_file TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_trained_models_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trained_models (
            model_id TEXT PRIMARY KEY,
            model_name TEXT NOT NULL,
            session_id TEXT NOT NULL,
            dataset_id TEXT NOT NULL,
            algorithm TEXT NOT NULL,
            hyperparameters TEXT NOT NULL DEFAULT '{}',
            model_file TEXT NOT NULL,
            train_size INTEGER NOT NULL,
            val_size INTEGER NOT NULL,
            metrics TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
