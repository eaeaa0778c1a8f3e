use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{StudySessionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("end_time is before start_time")]
    InvalidTimeRange,

    #[error("active session carries an end_time")]
    ActiveWithEndTime,

    #[error("negative {field}")]
    NegativeValue { field: &'static str },
}

/// One study-timer session.
///
/// Created when the timer starts, mutated only by the owning timer service,
/// and closed exactly once. At most one active session should exist per user;
/// the ledger enforces that with a partial unique index, since the row schema
/// alone cannot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    id: StudySessionId,
    user_id: UserId,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration_secs: i64,
    points_earned: i64,
    is_active: bool,
}

impl StudySession {
    /// Opens a fresh active session starting now.
    #[must_use]
    pub fn open(id: StudySessionId, user_id: UserId, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            start_time,
            end_time: None,
            duration_secs: 0,
            points_earned: 0,
            is_active: true,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Rejects rows that are simultaneously active and ended, rows whose end
    /// precedes their start, and negative durations or points.
    pub fn from_persisted(
        id: StudySessionId,
        user_id: UserId,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        duration_secs: i64,
        points_earned: i64,
        is_active: bool,
    ) -> Result<Self, StudySessionError> {
        if is_active && end_time.is_some() {
            return Err(StudySessionError::ActiveWithEndTime);
        }
        if let Some(end) = end_time {
            if end < start_time {
                return Err(StudySessionError::InvalidTimeRange);
            }
        }
        if duration_secs < 0 {
            return Err(StudySessionError::NegativeValue {
                field: "duration_secs",
            });
        }
        if points_earned < 0 {
            return Err(StudySessionError::NegativeValue {
                field: "points_earned",
            });
        }

        Ok(Self {
            id,
            user_id,
            start_time,
            end_time,
            duration_secs,
            points_earned,
            is_active,
        })
    }

    /// Close the session with the given elapsed seconds.
    ///
    /// Points are floor-divided by the accrual unit; partial units are
    /// discarded, not rounded. Closing an already-closed session is a no-op,
    /// preserving the first termination.
    pub fn close(&mut self, ended_at: DateTime<Utc>, elapsed_secs: i64, accrual_unit_secs: u32) {
        if !self.is_active {
            return;
        }
        let elapsed = elapsed_secs.max(0);
        self.end_time = Some(ended_at);
        self.duration_secs = elapsed;
        self.points_earned = elapsed / i64::from(accrual_unit_secs.max(1));
        self.is_active = false;
    }

    /// Whole seconds between the session start and `now`, never negative.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }

    /// Session duration expressed in hours, for the study-hours tally.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration_secs as f64 / 3600.0
    }

    #[must_use]
    pub fn id(&self) -> StudySessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    #[must_use]
    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    #[must_use]
    pub fn points_earned(&self) -> i64 {
        self.points_earned
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn open_session() -> StudySession {
        StudySession::open(StudySessionId::generate(), UserId::new(1), fixed_now())
    }

    #[test]
    fn close_floor_divides_points() {
        let mut session = open_session();
        session.close(fixed_now() + Duration::seconds(34), 34, 5);

        assert!(!session.is_active());
        assert_eq!(session.duration_secs(), 34);
        // 34 / 5 = 6 whole units, partial unit discarded
        assert_eq!(session.points_earned(), 6);
    }

    #[test]
    fn close_is_a_no_op_when_already_closed() {
        let mut session = open_session();
        session.close(fixed_now() + Duration::seconds(10), 10, 5);
        let first = session.clone();

        session.close(fixed_now() + Duration::seconds(99), 99, 5);
        assert_eq!(session, first);
    }

    #[test]
    fn from_persisted_rejects_active_with_end_time() {
        let err = StudySession::from_persisted(
            StudySessionId::generate(),
            UserId::new(1),
            fixed_now(),
            Some(fixed_now()),
            0,
            0,
            true,
        )
        .unwrap_err();
        assert_eq!(err, StudySessionError::ActiveWithEndTime);
    }

    #[test]
    fn from_persisted_rejects_end_before_start() {
        let err = StudySession::from_persisted(
            StudySessionId::generate(),
            UserId::new(1),
            fixed_now(),
            Some(fixed_now() - Duration::seconds(1)),
            0,
            0,
            false,
        )
        .unwrap_err();
        assert_eq!(err, StudySessionError::InvalidTimeRange);
    }

    #[test]
    fn elapsed_never_negative() {
        let session = open_session();
        assert_eq!(session.elapsed_at(fixed_now() - Duration::seconds(30)), 0);
        assert_eq!(session.elapsed_at(fixed_now() + Duration::seconds(30)), 30);
    }
}
