use thiserror::Error;

use crate::model::{QuestionError, QuizResultError, StudySessionError, UserError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizResult(#[from] QuizResultError),
    #[error(transparent)]
    User(#[from] UserError),
}
