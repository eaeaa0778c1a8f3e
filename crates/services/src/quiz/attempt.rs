use chrono::{DateTime, Duration, Utc};

use study_core::model::{AnsweredQuestion, Question, RecordedAnswer, Subject, UserId};

use crate::error::QuizError;

/// One run through a sampled question pool.
///
/// Pure per-attempt machine: a cursor over the shuffled pool, the pending
/// selection, an attempt-local score tally, and the recorded answers for the
/// audit row. Section-wide completion is never read from here; the service
/// re-derives it from the ledger at finish time so concurrent attempts stay
/// correct.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    user_id: UserId,
    subject: Subject,
    section_number: u32,
    questions: Vec<Question>,
    cursor: usize,
    selected: Option<usize>,
    score: u32,
    answers: Vec<RecordedAnswer>,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    finished: bool,
}

impl QuizAttempt {
    pub(crate) fn new(
        user_id: UserId,
        subject: Subject,
        section_number: u32,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
        time_limit_secs: u32,
    ) -> Self {
        Self {
            user_id,
            subject,
            section_number,
            questions,
            cursor: 0,
            selected: None,
            score: 0,
            answers: Vec::new(),
            started_at,
            deadline: started_at + Duration::seconds(i64::from(time_limit_secs)),
            finished: false,
        }
    }

    /// Record the pending selection for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` past the last question and
    /// `QuizError::SelectionOutOfRange` for an index outside the options.
    pub fn select_answer(&mut self, index: usize) -> Result<(), QuizError> {
        let Some(question) = self.current_question() else {
            return Err(QuizError::Finished);
        };
        let len = question.options().len();
        if index >= len {
            return Err(QuizError::SelectionOutOfRange { index, len });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Commit the pending selection (or the unanswered sentinel) against the
    /// current question and move the cursor forward. Returns the outcome
    /// record for the ledger upsert, or `None` past the last question.
    pub(crate) fn commit_current(&mut self, now: DateTime<Utc>) -> Option<AnsweredQuestion> {
        if self.cursor >= self.questions.len() {
            return None;
        }
        let question = &self.questions[self.cursor];
        let selected = self.selected.take();
        let is_correct = selected.is_some_and(|i| question.is_correct(i));
        if is_correct {
            self.score += 1;
        }
        self.answers.push(RecordedAnswer {
            question_id: question.id(),
            prompt: question.prompt().to_string(),
            selected,
            selected_text: selected.and_then(|i| question.option_text(i).map(str::to_string)),
            correct_text: question.correct_text().to_string(),
            is_correct,
        });
        let record = AnsweredQuestion::new(self.user_id, question.id(), is_correct, now);
        self.cursor += 1;
        Some(record)
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.cursor)
    }

    /// Whether the attempt-level countdown has run out.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whole seconds since the attempt started, never negative.
    #[must_use]
    pub fn time_taken(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }

    /// True once every sampled question has been committed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
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
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Attempt-local correct tally.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.cursor)
    }

    #[must_use]
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
