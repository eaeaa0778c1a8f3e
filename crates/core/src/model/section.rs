use thiserror::Error;

use crate::model::{Subject, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SectionError {
    #[error("section {section_number} has no questions")]
    NoQuestions { section_number: u32 },
}

/// A fixed bucket of questions for a subject, gated by the prior section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    subject: Subject,
    section_number: u32,
    total_questions: u32,
}

impl Section {
    /// Creates a section descriptor.
    ///
    /// # Errors
    ///
    /// Returns `SectionError::NoQuestions` for an empty section.
    pub fn new(
        subject: Subject,
        section_number: u32,
        total_questions: u32,
    ) -> Result<Self, SectionError> {
        if total_questions == 0 {
            return Err(SectionError::NoQuestions { section_number });
        }
        Ok(Self {
            subject,
            section_number,
            total_questions,
        })
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
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }
}

/// Per-user progress in one section.
///
/// Always derived from the authoritative answered-question count, never
/// incremented, so concurrent attempts converge on the same row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    user_id: UserId,
    subject: Subject,
    section_number: u32,
    completed_questions: u32,
    is_completed: bool,
}

impl SectionProgress {
    /// Derives progress from the count of distinct correctly-answered
    /// questions in the section.
    #[must_use]
    pub fn derive(
        user_id: UserId,
        subject: Subject,
        section_number: u32,
        correct_answers: u32,
        total_questions: u32,
    ) -> Self {
        Self {
            user_id,
            subject,
            section_number,
            completed_questions: correct_answers,
            is_completed: correct_answers >= total_questions,
        }
    }

    /// Rehydrate a stored progress row.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        subject: Subject,
        section_number: u32,
        completed_questions: u32,
        is_completed: bool,
    ) -> Self {
        Self {
            user_id,
            subject,
            section_number,
            completed_questions,
            is_completed,
        }
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
    pub fn completed_questions(&self) -> u32 {
        self.completed_questions
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject::new("english").unwrap()
    }

    #[test]
    fn empty_section_is_rejected() {
        let err = Section::new(subject(), 3, 0).unwrap_err();
        assert_eq!(err, SectionError::NoQuestions { section_number: 3 });
    }

    #[test]
    fn derive_completes_exactly_at_total() {
        let below = SectionProgress::derive(UserId::new(1), subject(), 1, 14, 15);
        assert!(!below.is_completed());
        assert_eq!(below.completed_questions(), 14);

        let at = SectionProgress::derive(UserId::new(1), subject(), 1, 15, 15);
        assert!(at.is_completed());
    }
}
