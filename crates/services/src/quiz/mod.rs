//! Quiz progression engine: per-attempt state machine, section sampling, and
//! completion-driven unlock derivation.

mod attempt;
mod sections;
mod service;

pub use attempt::QuizAttempt;
pub use sections::SectionOverview;
pub use service::{AnswerOutcome, AttemptStart, AttemptSummary, QuizService};
