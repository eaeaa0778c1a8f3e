use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{PointCategory, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user handle must not be empty")]
    EmptyHandle,

    #[error("total_points ({total}) does not match category sum ({sum})")]
    PointsMismatch { total: i64, sum: i64 },

    #[error("negative value for {field}")]
    NegativeValue { field: &'static str },
}

/// A tracked user with per-category points and cumulative study hours.
///
/// `total_points` is denormalized; the constructors reject rows where it
/// drifts from the category sum, and the mutation helpers keep it aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    handle: String,
    counter_points: i64,
    quiz_points: i64,
    task_points: i64,
    referral_points: i64,
    total_points: i64,
    study_hours: f64,
    last_active: DateTime<Utc>,
}

impl User {
    /// Creates a brand-new user with zeroed points.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyHandle` if the identity handle is blank.
    pub fn new(
        id: UserId,
        handle: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let handle = handle.into();
        if handle.trim().is_empty() {
            return Err(UserError::EmptyHandle);
        }

        Ok(Self {
            id,
            handle,
            counter_points: 0,
            quiz_points: 0,
            task_points: 0,
            referral_points: 0,
            total_points: 0,
            study_hours: 0.0,
            last_active: created_at,
        })
    }

    /// Rehydrate a user from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError::PointsMismatch` if the denormalized total does not
    /// equal the category sum, and `UserError::NegativeValue` for negative
    /// point or hour columns.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: UserId,
        handle: String,
        counter_points: i64,
        quiz_points: i64,
        task_points: i64,
        referral_points: i64,
        total_points: i64,
        study_hours: f64,
        last_active: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if handle.trim().is_empty() {
            return Err(UserError::EmptyHandle);
        }
        for (field, value) in [
            ("counter_points", counter_points),
            ("quiz_points", quiz_points),
            ("task_points", task_points),
            ("referral_points", referral_points),
            ("total_points", total_points),
        ] {
            if value < 0 {
                return Err(UserError::NegativeValue { field });
            }
        }
        if study_hours < 0.0 {
            return Err(UserError::NegativeValue {
                field: "study_hours",
            });
        }

        let sum = counter_points + quiz_points + task_points + referral_points;
        if sum != total_points {
            return Err(UserError::PointsMismatch {
                total: total_points,
                sum,
            });
        }

        Ok(Self {
            id,
            handle,
            counter_points,
            quiz_points,
            task_points,
            referral_points,
            total_points,
            study_hours,
            last_active,
        })
    }

    /// Add `amount` points to one category, keeping the total in sync.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NegativeValue` if the credit would drive the
    /// category below zero.
    pub fn credit(&mut self, category: PointCategory, amount: i64) -> Result<(), UserError> {
        let slot = match category {
            PointCategory::Counter => &mut self.counter_points,
            PointCategory::Quiz => &mut self.quiz_points,
            PointCategory::Task => &mut self.task_points,
            PointCategory::Referral => &mut self.referral_points,
        };
        let updated = *slot + amount;
        if updated < 0 {
            return Err(UserError::NegativeValue {
                field: category.as_str(),
            });
        }
        *slot = updated;
        self.total_points += amount;
        Ok(())
    }

    /// Add to the cumulative study hours.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NegativeValue` for a negative delta.
    pub fn add_study_hours(&mut self, hours: f64) -> Result<(), UserError> {
        if hours < 0.0 {
            return Err(UserError::NegativeValue {
                field: "study_hours",
            });
        }
        self.study_hours += hours;
        Ok(())
    }

    /// Record activity at the given instant.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_active = at;
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Points currently held in one category.
    #[must_use]
    pub fn points_in(&self, category: PointCategory) -> i64 {
        match category {
            PointCategory::Counter => self.counter_points,
            PointCategory::Quiz => self.quiz_points,
            PointCategory::Task => self.task_points,
            PointCategory::Referral => self.referral_points,
        }
    }

    #[must_use]
    pub fn total_points(&self) -> i64 {
        self.total_points
    }

    #[must_use]
    pub fn study_hours(&self) -> f64 {
        self.study_hours
    }

    #[must_use]
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_user() -> User {
        User::new(UserId::new(1), "student", fixed_now()).unwrap()
    }

    #[test]
    fn credit_keeps_total_in_sync() {
        let mut user = build_user();
        user.credit(PointCategory::Counter, 12).unwrap();
        user.credit(PointCategory::Quiz, 30).unwrap();

        assert_eq!(user.points_in(PointCategory::Counter), 12);
        assert_eq!(user.points_in(PointCategory::Quiz), 30);
        assert_eq!(user.total_points(), 42);
    }

    #[test]
    fn from_persisted_rejects_drifted_total() {
        let err = User::from_persisted(
            UserId::new(1),
            "student".into(),
            10,
            20,
            0,
            0,
            31,
            0.0,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, UserError::PointsMismatch { total: 31, sum: 30 });
    }

    #[test]
    fn from_persisted_rejects_negative_points() {
        let err = User::from_persisted(
            UserId::new(1),
            "student".into(),
            -1,
            0,
            0,
            0,
            -1,
            0.0,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, UserError::NegativeValue { .. }));
    }

    #[test]
    fn empty_handle_is_rejected() {
        assert!(matches!(
            User::new(UserId::new(1), "  ", fixed_now()),
            Err(UserError::EmptyHandle)
        ));
    }

    #[test]
    fn credit_cannot_go_negative() {
        let mut user = build_user();
        user.credit(PointCategory::Task, 5).unwrap();
        assert!(user.credit(PointCategory::Task, -6).is_err());
        assert_eq!(user.points_in(PointCategory::Task), 5);
    }
}
