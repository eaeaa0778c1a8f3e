use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{
    AnsweredQuestion, PointCategory, Question, QuestionId, QuizResult, Section, SectionProgress,
    StudySession, StudySessionId, Subject, User, UserId,
};

/// Errors surfaced by ledger adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// User rows: identity, denormalized points, and study hours.
///
/// `add_points` and `add_study_hours` are row-level atomic increments. They
/// replace read-modify-write of the running totals so two attempts or two
/// open tabs finishing near-simultaneously cannot lose a credit.
#[async_trait]
pub trait UserLedger: Send + Sync {
    /// Insert or replace a user row.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the row cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), LedgerError>;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if missing, or other ledger errors.
    async fn get_user(&self, id: UserId) -> Result<User, LedgerError>;

    /// Look up a user by their stable identity handle.
    ///
    /// # Errors
    ///
    /// Returns ledger errors; an unknown handle is `Ok(None)`.
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, LedgerError>;

    /// Atomically add `amount` to one category and to `total_points`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown user.
    async fn add_points(
        &self,
        id: UserId,
        category: PointCategory,
        amount: i64,
    ) -> Result<(), LedgerError>;

    /// Atomically add to the cumulative study hours.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown user.
    async fn add_study_hours(&self, id: UserId, hours: f64) -> Result<(), LedgerError>;

    /// Record user activity.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown user.
    async fn touch_last_active(&self, id: UserId, at: DateTime<Utc>) -> Result<(), LedgerError>;
}

/// Study session rows. At most one active session per user.
#[async_trait]
pub trait StudySessionLedger: Send + Sync {
    /// Insert a freshly opened session row.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Conflict` if the user already has an active
    /// session, or other ledger errors.
    async fn create_session(&self, session: &StudySession) -> Result<(), LedgerError>;

    /// Fetch a session by id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if missing.
    async fn get_session(&self, id: StudySessionId) -> Result<StudySession, LedgerError>;

    /// Overwrite an existing session row.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the row does not exist.
    async fn update_session(&self, session: &StudySession) -> Result<(), LedgerError>;

    /// The user's active session, if any.
    ///
    /// # Errors
    ///
    /// Returns ledger errors; no active session is `Ok(None)`.
    async fn active_session(&self, user: UserId) -> Result<Option<StudySession>, LedgerError>;
}

/// Read-only quiz content: questions and section descriptors.
#[async_trait]
pub trait QuestionLedger: Send + Sync {
    /// All active questions in one section.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn questions_in_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Vec<Question>, LedgerError>;

    /// Section descriptors for a subject, ordered by section number.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn sections(&self, subject: &Subject) -> Result<Vec<Section>, LedgerError>;

    /// One section descriptor.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown section.
    async fn get_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Section, LedgerError>;
}

/// Answered-question rows keyed by `(user, question)`, upsert semantics.
#[async_trait]
pub trait AnswerLedger: Send + Sync {
    /// Insert or overwrite the latest outcome for a `(user, question)` pair.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn upsert_answer(&self, answer: &AnsweredQuestion) -> Result<(), LedgerError>;

    /// Ids of every question the user currently has marked correct, across
    /// all subjects.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn correct_question_ids(&self, user: UserId) -> Result<HashSet<QuestionId>, LedgerError>;

    /// Authoritative count of distinct correctly-answered questions in one
    /// section.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn correct_count_in_section(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<u32, LedgerError>;
}

/// Per-user, per-section progress rows.
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    /// Insert or overwrite a derived progress row.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn upsert_progress(&self, progress: &SectionProgress) -> Result<(), LedgerError>;

    /// One stored progress row, if present.
    ///
    /// # Errors
    ///
    /// Returns ledger errors; a missing row is `Ok(None)`.
    async fn get_progress(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Option<SectionProgress>, LedgerError>;

    /// All stored progress rows for a subject, ordered by section number.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn progress_for_subject(
        &self,
        user: UserId,
        subject: &Subject,
    ) -> Result<Vec<SectionProgress>, LedgerError>;
}

/// Append-only quiz attempt audit rows.
#[async_trait]
pub trait QuizResultLedger: Send + Sync {
    /// Append an audit row; rows are never mutated afterwards.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn append_result(&self, result: &QuizResult) -> Result<i64, LedgerError>;

    /// Audit rows for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns ledger errors.
    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, LedgerError>;
}

/// Simple in-memory ledger for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    sessions: Arc<Mutex<HashMap<StudySessionId, StudySession>>>,
    questions: Arc<Mutex<Vec<Question>>>,
    sections: Arc<Mutex<Vec<Section>>>,
    answers: Arc<Mutex<HashMap<(UserId, QuestionId), AnsweredQuestion>>>,
    progress: Arc<Mutex<HashMap<(UserId, Subject, u32), SectionProgress>>>,
    results: Arc<Mutex<Vec<QuizResult>>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed authored question content (content is read-only through the
    /// trait surface).
    pub fn seed_question(&self, question: Question) {
        if let Ok(mut guard) = self.questions.lock() {
            guard.push(question);
        }
    }

    /// Seed an authored section descriptor.
    pub fn seed_section(&self, section: Section) {
        if let Ok(mut guard) = self.sections.lock() {
            guard.push(section);
        }
    }

    /// Bundle this store into a [`Ledger`] aggregate.
    #[must_use]
    pub fn ledger(&self) -> Ledger {
        Ledger {
            users: Arc::new(self.clone()),
            sessions: Arc::new(self.clone()),
            questions: Arc::new(self.clone()),
            answers: Arc::new(self.clone()),
            progress: Arc::new(self.clone()),
            results: Arc::new(self.clone()),
        }
    }

    fn lock_err<E: std::fmt::Display>(e: E) -> LedgerError {
        LedgerError::Connection(e.to_string())
    }

    fn question_key(&self, id: QuestionId) -> Result<Option<(Subject, u32)>, LedgerError> {
        let guard = self.questions.lock().map_err(Self::lock_err)?;
        Ok(guard
            .iter()
            .find(|q| q.id() == id)
            .map(|q| (q.subject().clone(), q.section_number())))
    }
}

#[async_trait]
impl UserLedger for InMemoryLedger {
    async fn upsert_user(&self, user: &User) -> Result<(), LedgerError> {
        let mut guard = self.users.lock().map_err(Self::lock_err)?;
        guard.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, LedgerError> {
        let guard = self.users.lock().map_err(Self::lock_err)?;
        guard.get(&id).cloned().ok_or(LedgerError::NotFound)
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, LedgerError> {
        let guard = self.users.lock().map_err(Self::lock_err)?;
        Ok(guard.values().find(|u| u.handle() == handle).cloned())
    }

    async fn add_points(
        &self,
        id: UserId,
        category: PointCategory,
        amount: i64,
    ) -> Result<(), LedgerError> {
        let mut guard = self.users.lock().map_err(Self::lock_err)?;
        let user = guard.get_mut(&id).ok_or(LedgerError::NotFound)?;
        user.credit(category, amount)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    async fn add_study_hours(&self, id: UserId, hours: f64) -> Result<(), LedgerError> {
        let mut guard = self.users.lock().map_err(Self::lock_err)?;
        let user = guard.get_mut(&id).ok_or(LedgerError::NotFound)?;
        user.add_study_hours(hours)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    async fn touch_last_active(&self, id: UserId, at: DateTime<Utc>) -> Result<(), LedgerError> {
        let mut guard = self.users.lock().map_err(Self::lock_err)?;
        let user = guard.get_mut(&id).ok_or(LedgerError::NotFound)?;
        user.touch(at);
        Ok(())
    }
}

#[async_trait]
impl StudySessionLedger for InMemoryLedger {
    async fn create_session(&self, session: &StudySession) -> Result<(), LedgerError> {
        let mut guard = self.sessions.lock().map_err(Self::lock_err)?;
        let already_active = guard
            .values()
            .any(|s| s.user_id() == session.user_id() && s.is_active());
        if session.is_active() && already_active {
            return Err(LedgerError::Conflict);
        }
        guard.insert(session.id(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: StudySessionId) -> Result<StudySession, LedgerError> {
        let guard = self.sessions.lock().map_err(Self::lock_err)?;
        guard.get(&id).cloned().ok_or(LedgerError::NotFound)
    }

    async fn update_session(&self, session: &StudySession) -> Result<(), LedgerError> {
        let mut guard = self.sessions.lock().map_err(Self::lock_err)?;
        if !guard.contains_key(&session.id()) {
            return Err(LedgerError::NotFound);
        }
        guard.insert(session.id(), session.clone());
        Ok(())
    }

    async fn active_session(&self, user: UserId) -> Result<Option<StudySession>, LedgerError> {
        let guard = self.sessions.lock().map_err(Self::lock_err)?;
        Ok(guard
            .values()
            .find(|s| s.user_id() == user && s.is_active())
            .cloned())
    }
}

#[async_trait]
impl QuestionLedger for InMemoryLedger {
    async fn questions_in_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Vec<Question>, LedgerError> {
        let guard = self.questions.lock().map_err(Self::lock_err)?;
        Ok(guard
            .iter()
            .filter(|q| q.subject() == subject && q.section_number() == section_number)
            .cloned()
            .collect())
    }

    async fn sections(&self, subject: &Subject) -> Result<Vec<Section>, LedgerError> {
        let guard = self.sections.lock().map_err(Self::lock_err)?;
        let mut found: Vec<Section> = guard
            .iter()
            .filter(|s| s.subject() == subject)
            .cloned()
            .collect();
        found.sort_by_key(Section::section_number);
        Ok(found)
    }

    async fn get_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Section, LedgerError> {
        let guard = self.sections.lock().map_err(Self::lock_err)?;
        guard
            .iter()
            .find(|s| s.subject() == subject && s.section_number() == section_number)
            .cloned()
            .ok_or(LedgerError::NotFound)
    }
}

#[async_trait]
impl AnswerLedger for InMemoryLedger {
    async fn upsert_answer(&self, answer: &AnsweredQuestion) -> Result<(), LedgerError> {
        let mut guard = self.answers.lock().map_err(Self::lock_err)?;
        guard.insert((answer.user_id(), answer.question_id()), answer.clone());
        Ok(())
    }

    async fn correct_question_ids(&self, user: UserId) -> Result<HashSet<QuestionId>, LedgerError> {
        let guard = self.answers.lock().map_err(Self::lock_err)?;
        Ok(guard
            .values()
            .filter(|a| a.user_id() == user && a.is_correct())
            .map(AnsweredQuestion::question_id)
            .collect())
    }

    async fn correct_count_in_section(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<u32, LedgerError> {
        let correct: Vec<QuestionId> = {
            let guard = self.answers.lock().map_err(Self::lock_err)?;
            guard
                .values()
                .filter(|a| a.user_id() == user && a.is_correct())
                .map(AnsweredQuestion::question_id)
                .collect()
        };

        let mut count = 0_u32;
        for id in correct {
            if let Some((answer_subject, answer_section)) = self.question_key(id)? {
                if &answer_subject == subject && answer_section == section_number {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl ProgressLedger for InMemoryLedger {
    async fn upsert_progress(&self, progress: &SectionProgress) -> Result<(), LedgerError> {
        let mut guard = self.progress.lock().map_err(Self::lock_err)?;
        guard.insert(
            (
                progress.user_id(),
                progress.subject().clone(),
                progress.section_number(),
            ),
            progress.clone(),
        );
        Ok(())
    }

    async fn get_progress(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Option<SectionProgress>, LedgerError> {
        let guard = self.progress.lock().map_err(Self::lock_err)?;
        Ok(guard
            .get(&(user, subject.clone(), section_number))
            .cloned())
    }

    async fn progress_for_subject(
        &self,
        user: UserId,
        subject: &Subject,
    ) -> Result<Vec<SectionProgress>, LedgerError> {
        let guard = self.progress.lock().map_err(Self::lock_err)?;
        let mut found: Vec<SectionProgress> = guard
            .values()
            .filter(|p| p.user_id() == user && p.subject() == subject)
            .cloned()
            .collect();
        found.sort_by_key(SectionProgress::section_number);
        Ok(found)
    }
}

#[async_trait]
impl QuizResultLedger for InMemoryLedger {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, LedgerError> {
        let mut guard = self.results.lock().map_err(Self::lock_err)?;
        guard.push(result.clone());
        i64::try_from(guard.len()).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, LedgerError> {
        let guard = self.results.lock().map_err(Self::lock_err)?;
        Ok(guard
            .iter()
            .filter(|r| r.user_id() == user)
            .cloned()
            .collect())
    }
}

/// Aggregates the per-table ledgers behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Ledger {
    pub users: Arc<dyn UserLedger>,
    pub sessions: Arc<dyn StudySessionLedger>,
    pub questions: Arc<dyn QuestionLedger>,
    pub answers: Arc<dyn AnswerLedger>,
    pub progress: Arc<dyn ProgressLedger>,
    pub results: Arc<dyn QuizResultLedger>,
}

impl Ledger {
    #[must_use]
    pub fn in_memory() -> Self {
        InMemoryLedger::new().ledger()
    }
}
