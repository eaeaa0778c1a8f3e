#![forbid(unsafe_code)]

pub mod error;
pub mod points;
pub mod quiz;
pub mod timer;

pub use study_core::Clock;

pub use error::{QuizError, TimerError};
pub use points::PointsAccrual;
pub use quiz::{
    AnswerOutcome, AttemptStart, AttemptSummary, QuizAttempt, QuizService, SectionOverview,
};
pub use timer::{
    InMemorySuspendStore, JsonFileSuspendStore, LifecycleEvent, SuspendMarker, SuspendStore,
    SuspendStoreError, TimerMachine, TimerPhase, TimerService,
};
