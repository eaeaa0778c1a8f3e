use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use ledger::repository::{
    AnswerLedger, LedgerError, ProgressLedger, QuestionLedger, QuizResultLedger,
};
use study_core::Clock;
use study_core::model::{
    AnsweredQuestion, PointCategory, Question, QuizResult, QuizSettings, SectionProgress, Subject,
    UserId,
};

use super::attempt::QuizAttempt;
use super::sections::{SectionOverview, unlocked_flags};
use crate::error::QuizError;
use crate::points::PointsAccrual;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of sampling a section for a new attempt.
#[derive(Debug)]
pub enum AttemptStart {
    /// The pool was empty: every question is already marked correct, so the
    /// section is complete and no attempt is started.
    SectionComplete,
    Started(QuizAttempt),
}

/// What a finished attempt settled to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary {
    pub score: u32,
    pub total_questions: u32,
    pub points_earned: i64,
    pub progress: SectionProgress,
}

/// Result of committing one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    /// Present when this was the last sampled question and the attempt
    /// auto-finished.
    pub finished: Option<AttemptSummary>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives quiz attempts against the ledger: sampling, per-question upserts,
/// and the finish sequence that re-derives section progress.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    questions: Arc<dyn QuestionLedger>,
    answers: Arc<dyn AnswerLedger>,
    progress: Arc<dyn ProgressLedger>,
    results: Arc<dyn QuizResultLedger>,
    points: PointsAccrual,
    settings: QuizSettings,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionLedger>,
        answers: Arc<dyn AnswerLedger>,
        progress: Arc<dyn ProgressLedger>,
        results: Arc<dyn QuizResultLedger>,
        points: PointsAccrual,
        settings: QuizSettings,
    ) -> Self {
        Self {
            clock,
            questions,
            answers,
            progress,
            results,
            points,
            settings,
        }
    }

    /// Sample a section and start an attempt over the full shuffled pool.
    ///
    /// The pool is every active question in the section minus the set the
    /// user has ever answered correctly; it shrinks as the user improves. An
    /// empty pool short-circuits to [`AttemptStart::SectionComplete`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownSection` for a section without a
    /// descriptor, and propagates ledger errors.
    pub async fn start_attempt(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<AttemptStart, QuizError> {
        match self.questions.get_section(subject, section_number).await {
            Ok(_) => {}
            Err(LedgerError::NotFound) => {
                return Err(QuizError::UnknownSection { section_number });
            }
            Err(e) => return Err(e.into()),
        }

        let pool = self
            .questions
            .questions_in_section(subject, section_number)
            .await?;
        let correct = self.answers.correct_question_ids(user).await?;
        let mut pool: Vec<Question> = pool
            .into_iter()
            .filter(|q| !correct.contains(&q.id()))
            .collect();
        if pool.is_empty() {
            return Ok(AttemptStart::SectionComplete);
        }
        pool.shuffle(&mut rand::rng());

        Ok(AttemptStart::Started(QuizAttempt::new(
            user,
            subject.clone(),
            section_number,
            pool,
            self.clock.now(),
            self.settings.attempt_time_limit_secs(),
        )))
    }

    /// Commit the pending selection: upsert the `(user, question)` outcome
    /// (last write wins, downgrades included) and advance the cursor. The
    /// attempt auto-finishes after the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` if nothing is selected yet,
    /// `QuizError::Finished` past the end, and propagates finish errors.
    pub async fn answer_current(
        &self,
        attempt: &mut QuizAttempt,
    ) -> Result<AnswerOutcome, QuizError> {
        if attempt.is_finished() || attempt.is_complete() {
            return Err(QuizError::Finished);
        }
        if attempt.selected().is_none() {
            return Err(QuizError::NoSelection);
        }

        let now = self.clock.now();
        let Some(record) = attempt.commit_current(now) else {
            return Err(QuizError::Finished);
        };
        self.upsert_best_effort(&record).await;

        let is_correct = record.is_correct();
        let finished = if attempt.is_complete() {
            Some(self.finish(attempt).await?)
        } else {
            None
        };
        Ok(AnswerOutcome {
            is_correct,
            finished,
        })
    }

    /// Check the attempt countdown. On expiry the remaining questions are
    /// drained as unanswered and the attempt finishes; before expiry this
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Propagates finish errors.
    pub async fn tick(
        &self,
        attempt: &mut QuizAttempt,
    ) -> Result<Option<AttemptSummary>, QuizError> {
        if attempt.is_finished() || !attempt.expired(self.clock.now()) {
            return Ok(None);
        }
        let now = self.clock.now();
        while let Some(record) = attempt.commit_current(now) {
            self.upsert_best_effort(&record).await;
        }
        Ok(Some(self.finish(attempt).await?))
    }

    /// Finish the attempt: strictly after the per-question upserts, re-query
    /// the authoritative correct count, derive and upsert the section
    /// progress, append the audit row, and credit the quiz points through the
    /// atomic increment.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` on a second call and propagates ledger
    /// errors; the attempt tally itself is already settled either way.
    pub async fn finish(&self, attempt: &mut QuizAttempt) -> Result<AttemptSummary, QuizError> {
        if attempt.is_finished() {
            return Err(QuizError::Finished);
        }
        attempt.mark_finished();

        let now = self.clock.now();
        let user = attempt.user_id();
        let subject = attempt.subject().clone();
        let section_number = attempt.section_number();

        let correct = self
            .answers
            .correct_count_in_section(user, &subject, section_number)
            .await?;
        let section = self.questions.get_section(&subject, section_number).await?;
        let progress = SectionProgress::derive(
            user,
            subject.clone(),
            section_number,
            correct,
            section.total_questions(),
        );
        self.progress.upsert_progress(&progress).await?;

        let points_earned =
            i64::from(attempt.score()) * i64::from(self.settings.points_per_correct());
        let result = QuizResult::new(
            user,
            subject,
            section_number,
            attempt.score(),
            attempt.total_questions(),
            points_earned,
            attempt.time_taken(now),
            attempt.answers().to_vec(),
            now,
        )?;
        self.results.append_result(&result).await?;

        if points_earned > 0 {
            self.points
                .credit(user, PointCategory::Quiz, points_earned)
                .await?;
        }
        debug!(
            %user,
            section = section_number,
            score = attempt.score(),
            points = points_earned,
            "attempt finished"
        );

        Ok(AttemptSummary {
            score: attempt.score(),
            total_questions: attempt.total_questions(),
            points_earned,
            progress,
        })
    }

    /// Section list for one subject: per-section completion counts and the
    /// unlock chain, recomputed from the answer rows on every call rather
    /// than cached.
    ///
    /// # Errors
    ///
    /// Propagates ledger errors.
    pub async fn section_overview(
        &self,
        user: UserId,
        subject: &Subject,
    ) -> Result<Vec<SectionOverview>, QuizError> {
        let sections = self.questions.sections(subject).await?;
        let stored = self.progress.progress_for_subject(user, subject).await?;

        let mut rows = Vec::with_capacity(sections.len());
        for section in sections {
            let derived = self
                .answers
                .correct_count_in_section(user, subject, section.section_number())
                .await?;
            let stored_count = stored
                .iter()
                .find(|p| p.section_number() == section.section_number())
                .map_or(0, SectionProgress::completed_questions);
            let completed_questions = derived.max(stored_count);
            let is_completed = completed_questions >= section.total_questions();
            rows.push(SectionOverview {
                section,
                completed_questions,
                is_completed,
                is_unlocked: false,
            });
        }

        let completed: Vec<bool> = rows.iter().map(|r| r.is_completed).collect();
        for (row, unlocked) in rows.iter_mut().zip(unlocked_flags(&completed)) {
            row.is_unlocked = unlocked;
        }
        Ok(rows)
    }

    /// Answer upserts are resilience-first: a dropped row costs one exclusion
    /// next sampling, not the attempt.
    async fn upsert_best_effort(&self, record: &AnsweredQuestion) {
        if let Err(error) = self.answers.upsert_answer(record).await {
            warn!(
                user = %record.user_id(),
                question = %record.question_id(),
                %error,
                "answer upsert dropped"
            );
        }
    }

    /// Mutable clock access, for driving a fixed clock in tests.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}
