use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject must not be empty")]
    Empty,
}

/// Normalized subject key, e.g. `english` or `french`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    /// Creates a subject, trimming and lowercasing the raw value.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::Empty` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SubjectError> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(SubjectError::Empty);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt must not be empty")]
    EmptyPrompt,

    #[error("a question needs at least two options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct_answer index {index} out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },
}

/// Immutable quiz content, authored out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    subject: Subject,
    section_number: u32,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Rejects empty prompts, fewer than two options, and a correct-answer
    /// index outside the option list.
    pub fn new(
        id: QuestionId,
        subject: Subject,
        section_number: u32,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }
        if correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            subject,
            section_number,
            prompt,
            options,
            correct_answer,
        })
    }

    /// Rehydrate a question from persisted storage, with the same checks as
    /// [`Question::new`].
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn from_persisted(
        id: QuestionId,
        subject: Subject,
        section_number: u32,
        prompt: String,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Result<Self, QuestionError> {
        Self::new(id, subject, section_number, prompt, options, correct_answer)
    }

    /// Whether the selected option index is the correct one.
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }

    /// Option text at `index`, if in range.
    #[must_use]
    pub fn option_text(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_text(&self) -> &str {
        &self.options[self.correct_answer]
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
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
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }
}
