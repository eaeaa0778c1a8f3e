//! Shared error types for the services crate.

use thiserror::Error;

use ledger::repository::LedgerError;
use study_core::model::{QuizResultError, StudySessionError};

/// Errors emitted by the study timer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimerError {
    #[error("a session is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors emitted by the quiz engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("attempt is already finished")]
    Finished,
    #[error("no answer selected")]
    NoSelection,
    #[error("selected option {index} out of range for {len} options")]
    SelectionOutOfRange { index: usize, len: usize },
    #[error("unknown section {section_number}")]
    UnknownSection { section_number: u32 },
    #[error(transparent)]
    Result(#[from] QuizResultError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
