use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, UserId};

/// Latest answer outcome for one `(user, question)` pair.
///
/// Upsert semantics: a later wrong answer overwrites a prior correct one, so
/// this record is the single source of truth for both quiz-pool exclusion and
/// section completion counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    user_id: UserId,
    question_id: QuestionId,
    is_correct: bool,
    answered_at: DateTime<Utc>,
}

impl AnsweredQuestion {
    #[must_use]
    pub fn new(
        user_id: UserId,
        question_id: QuestionId,
        is_correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_id,
            is_correct,
            answered_at,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn answered_at(&self) -> DateTime<Utc> {
        self.answered_at
    }
}
