mod answer;
mod ids;
mod points;
mod question;
mod quiz_result;
mod section;
mod session;
mod settings;
mod user;

pub use answer::AnsweredQuestion;
pub use ids::{ParseIdError, QuestionId, StudySessionId, UserId};
pub use points::PointCategory;
pub use question::{Question, QuestionError, Subject, SubjectError};
pub use quiz_result::{QuizResult, QuizResultError, RecordedAnswer};
pub use section::{Section, SectionError, SectionProgress};
pub use session::{StudySession, StudySessionError};
pub use settings::{QuizSettings, SettingsError, TimerSettings};
pub use user::{User, UserError};
