use study_core::model::{QuestionId, StudySessionId, Subject, UserId};

use crate::repository::LedgerError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, LedgerError> {
    i64::try_from(v).map_err(|_| LedgerError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, LedgerError> {
    u64::try_from(v)
        .map(UserId::new)
        .map_err(|_| LedgerError::Serialization(format!("invalid user id: {v}")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, LedgerError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| LedgerError::Serialization(format!("invalid question id: {v}")))
}

pub(crate) fn session_id_from_str(v: &str) -> Result<StudySessionId, LedgerError> {
    v.parse::<StudySessionId>()
        .map_err(|_| LedgerError::Serialization(format!("invalid session id: {v}")))
}

pub(crate) fn subject_from_str(v: &str) -> Result<Subject, LedgerError> {
    Subject::new(v).map_err(ser)
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, LedgerError> {
    u32::try_from(v).map_err(|_| LedgerError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, LedgerError> {
    usize::try_from(v).map_err(|_| LedgerError::Serialization(format!("invalid {field}: {v}")))
}
