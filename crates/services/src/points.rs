//! Thin point-accrual helper shared by the timer and the quiz engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use ledger::repository::{LedgerError, UserLedger};
use study_core::model::{PointCategory, UserId};

/// Credits points and study hours through the ledger's atomic increments.
///
/// Every credit goes through `UserLedger::add_points`, which bumps one
/// category and `total_points` together, so two attempts or two open timers
/// finishing near-simultaneously cannot lose a credit.
#[derive(Clone)]
pub struct PointsAccrual {
    users: Arc<dyn UserLedger>,
}

impl PointsAccrual {
    #[must_use]
    pub fn new(users: Arc<dyn UserLedger>) -> Self {
        Self { users }
    }

    /// Credit `amount` points in one category.
    ///
    /// # Errors
    ///
    /// Propagates ledger errors; nothing was credited in that case.
    pub async fn credit(
        &self,
        user: UserId,
        category: PointCategory,
        amount: i64,
    ) -> Result<(), LedgerError> {
        self.users.add_points(user, category, amount).await
    }

    /// Credit points, logging and swallowing failures. Used by accrual ticks,
    /// where a dropped credit must not end the session.
    pub async fn credit_best_effort(&self, user: UserId, category: PointCategory, amount: i64) {
        if let Err(error) = self.credit(user, category, amount).await {
            warn!(%user, %category, amount, %error, "point credit dropped");
        }
    }

    /// Add to the user's cumulative study hours.
    ///
    /// # Errors
    ///
    /// Propagates ledger errors.
    pub async fn credit_hours(&self, user: UserId, hours: f64) -> Result<(), LedgerError> {
        self.users.add_study_hours(user, hours).await
    }

    /// Add study hours, logging and swallowing failures.
    pub async fn credit_hours_best_effort(&self, user: UserId, hours: f64) {
        if let Err(error) = self.credit_hours(user, hours).await {
            warn!(%user, hours, %error, "study hours dropped");
        }
    }

    /// Record user activity, logging and swallowing failures.
    pub async fn touch_best_effort(&self, user: UserId, at: DateTime<Utc>) {
        if let Err(error) = self.users.touch_last_active(user, at).await {
            warn!(%user, %error, "last_active touch dropped");
        }
    }
}
