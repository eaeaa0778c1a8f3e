#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AnswerLedger, InMemoryLedger, Ledger, LedgerError, ProgressLedger, QuestionLedger,
    QuizResultLedger, StudySessionLedger, UserLedger,
};
