use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuestionId, Subject, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("score ({score}) exceeds answered questions ({answered})")]
    ScoreExceedsAnswered { score: u32, answered: u32 },

    #[error("negative time_taken_secs")]
    NegativeTimeTaken,
}

/// One answer as it was committed during an attempt, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    pub question_id: QuestionId,
    pub prompt: String,
    /// Selected option index; `None` when the countdown expired first.
    pub selected: Option<usize>,
    pub selected_text: Option<String>,
    pub correct_text: String,
    pub is_correct: bool,
}

/// Append-only audit row for one finished quiz attempt. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    user_id: UserId,
    subject: Subject,
    section_number: u32,
    score: u32,
    total_questions: u32,
    points_earned: i64,
    time_taken_secs: i64,
    answers: Vec<RecordedAnswer>,
    completed_at: DateTime<Utc>,
}

impl QuizResult {
    /// Builds an audit row from a finished attempt.
    ///
    /// # Errors
    ///
    /// Rejects a score larger than the number of recorded answers and a
    /// negative elapsed time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        subject: Subject,
        section_number: u32,
        score: u32,
        total_questions: u32,
        points_earned: i64,
        time_taken_secs: i64,
        answers: Vec<RecordedAnswer>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        let answered = u32::try_from(answers.len()).unwrap_or(u32::MAX);
        if score > answered {
            return Err(QuizResultError::ScoreExceedsAnswered { score, answered });
        }
        if time_taken_secs < 0 {
            return Err(QuizResultError::NegativeTimeTaken);
        }

        Ok(Self {
            user_id,
            subject,
            section_number,
            score,
            total_questions,
            points_earned,
            time_taken_secs,
            answers,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    #[must_use]
    pub fn section_number(&self) -> u32 {
        self.section_number
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn points_earned(&self) -> i64 {
        self.points_earned
    }

    #[must_use]
    pub fn time_taken_secs(&self) -> i64 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn answer(is_correct: bool) -> RecordedAnswer {
        RecordedAnswer {
            question_id: QuestionId::new(1),
            prompt: "Q".into(),
            selected: Some(0),
            selected_text: Some("a".into()),
            correct_text: "a".into(),
            is_correct,
        }
    }

    #[test]
    fn score_cannot_exceed_answers() {
        let err = QuizResult::new(
            UserId::new(1),
            Subject::new("english").unwrap(),
            1,
            2,
            15,
            20,
            120,
            vec![answer(true)],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuizResultError::ScoreExceedsAnswered {
                score: 2,
                answered: 1
            }
        );
    }

    #[test]
    fn audit_row_round_trips_answers() {
        let result = QuizResult::new(
            UserId::new(1),
            Subject::new("english").unwrap(),
            1,
            1,
            15,
            10,
            42,
            vec![answer(true), answer(false)],
            fixed_now(),
        )
        .unwrap();
        assert_eq!(result.answers().len(), 2);
        assert_eq!(result.points_earned(), 10);
    }
}
