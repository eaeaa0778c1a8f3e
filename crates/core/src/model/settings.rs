use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("max_session_age_secs must be at least the grace period")]
    StalenessBelowGrace,
}

/// Tunables for the study timer.
///
/// The accrual unit is a parameter of the state machine, not a constant:
/// one counter point per `accrual_unit_secs` elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    accrual_unit_secs: u32,
    grace_period_secs: u32,
    max_session_age_secs: u32,
}

impl TimerSettings {
    /// Defaults for a study timer:
    /// - one point per 5 elapsed seconds
    /// - 5 minutes of grace while the tab is hidden
    /// - sessions older than 12 hours are considered stale on recovery
    #[must_use]
    pub fn default_study() -> Self {
        Self {
            accrual_unit_secs: 5,
            grace_period_secs: 300,
            max_session_age_secs: 43_200,
        }
    }

    /// Creates custom timer settings.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero accrual unit or a staleness limit shorter
    /// than the grace period.
    pub fn new(
        accrual_unit_secs: u32,
        grace_period_secs: u32,
        max_session_age_secs: u32,
    ) -> Result<Self, SettingsError> {
        if accrual_unit_secs == 0 {
            return Err(SettingsError::ZeroValue {
                field: "accrual_unit_secs",
            });
        }
        if max_session_age_secs < grace_period_secs {
            return Err(SettingsError::StalenessBelowGrace);
        }
        Ok(Self {
            accrual_unit_secs,
            grace_period_secs,
            max_session_age_secs,
        })
    }

    #[must_use]
    pub fn accrual_unit_secs(&self) -> u32 {
        self.accrual_unit_secs
    }

    #[must_use]
    pub fn grace_period_secs(&self) -> u32 {
        self.grace_period_secs
    }

    #[must_use]
    pub fn max_session_age_secs(&self) -> u32 {
        self.max_session_age_secs
    }
}

/// Tunables for quiz attempts.
///
/// The countdown bounds the whole attempt; there is no per-question timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    points_per_correct: u32,
    attempt_time_limit_secs: u32,
}

impl QuizSettings {
    /// Defaults matching the shipped content: 10 points per correct answer,
    /// 5 minutes per attempt.
    #[must_use]
    pub fn default_study() -> Self {
        Self {
            points_per_correct: 10,
            attempt_time_limit_secs: 300,
        }
    }

    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the time limit is zero.
    pub fn new(points_per_correct: u32, attempt_time_limit_secs: u32) -> Result<Self, SettingsError> {
        if attempt_time_limit_secs == 0 {
            return Err(SettingsError::ZeroValue {
                field: "attempt_time_limit_secs",
            });
        }
        Ok(Self {
            points_per_correct,
            attempt_time_limit_secs,
        })
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    #[must_use]
    pub fn attempt_time_limit_secs(&self) -> u32 {
        self.attempt_time_limit_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_accrual_unit_rejected() {
        assert!(matches!(
            TimerSettings::new(0, 300, 43_200),
            Err(SettingsError::ZeroValue { .. })
        ));
    }

    #[test]
    fn staleness_must_cover_grace() {
        assert_eq!(
            TimerSettings::new(5, 600, 300).unwrap_err(),
            SettingsError::StalenessBelowGrace
        );
    }

    #[test]
    fn defaults_are_valid() {
        let timer = TimerSettings::default_study();
        assert!(
            TimerSettings::new(
                timer.accrual_unit_secs(),
                timer.grace_period_secs(),
                timer.max_session_age_secs()
            )
            .is_ok()
        );

        let quiz = QuizSettings::default_study();
        assert_eq!(quiz.points_per_correct(), 10);
    }
}
