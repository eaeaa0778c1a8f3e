use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use study_core::model::{Question, Section};

use crate::repository::{Ledger, LedgerError};

mod answer_repo;
mod mapping;
mod migrate;
mod progress_repo;
mod question_repo;
mod result_repo;
mod session_repo;
mod user_repo;

/// `SQLite`-backed ledger adapter.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteLedger {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or
    /// if the connection pragmas fail during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Insert authored question content (used by the seed binary and tests;
    /// content is read-only through the trait surface).
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the insert fails.
    pub async fn insert_question(&self, question: &Question) -> Result<(), LedgerError> {
        question_repo::insert_question(&self.pool, question).await
    }

    /// Insert an authored section descriptor.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the insert fails.
    pub async fn insert_section(&self, section: &Section) -> Result<(), LedgerError> {
        question_repo::insert_section(&self.pool, section).await
    }
}

impl Ledger {
    /// Build a `Ledger` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteLedger::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self {
            users: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            answers: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            results: Arc::new(repo),
        })
    }
}
