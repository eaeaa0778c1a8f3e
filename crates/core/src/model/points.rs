use serde::{Deserialize, Serialize};
use std::fmt;

/// The four point categories that feed the denormalized user total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    /// Points accrued by the study timer.
    Counter,
    /// Points earned from quiz attempts.
    Quiz,
    /// Points granted for one-off tasks.
    Task,
    /// Points granted for referrals.
    Referral,
}

impl PointCategory {
    /// Column-style name for logging and storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PointCategory::Counter => "counter_points",
            PointCategory::Quiz => "quiz_points",
            PointCategory::Task => "task_points",
            PointCategory::Referral => "referral_points",
        }
    }

    /// All categories, in the order they are summed into the total.
    #[must_use]
    pub fn all() -> [PointCategory; 4] {
        [
            PointCategory::Counter,
            PointCategory::Quiz,
            PointCategory::Task,
            PointCategory::Referral,
        ]
    }
}

impl fmt::Display for PointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
