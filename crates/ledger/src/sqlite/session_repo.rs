use chrono::{DateTime, Utc};
use sqlx::Row;

use study_core::model::{StudySession, StudySessionId, UserId};

use super::SqliteLedger;
use super::mapping::{conn, id_i64, ser, session_id_from_str, user_id_from_i64};
use crate::repository::{LedgerError, StudySessionLedger};

fn map_session_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudySession, LedgerError> {
    let id = session_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?;
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let start_time: DateTime<Utc> = row.try_get("start_time").map_err(ser)?;
    let end_time: Option<DateTime<Utc>> = row.try_get("end_time").map_err(ser)?;
    let duration: i64 = row.try_get("duration").map_err(ser)?;
    let points_earned: i64 = row.try_get("points_earned").map_err(ser)?;
    let is_active: bool = row.try_get("is_active").map_err(ser)?;

    StudySession::from_persisted(
        id,
        user_id,
        start_time,
        end_time,
        duration,
        points_earned,
        is_active,
    )
    .map_err(ser)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl StudySessionLedger for SqliteLedger {
    async fn create_session(&self, session: &StudySession) -> Result<(), LedgerError> {
        let res = sqlx::query(
            r"
                INSERT INTO study_sessions (
                    id, user_id, start_time, end_time, duration, points_earned, is_active
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(session.id().to_string())
        .bind(id_i64("user_id", session.user_id().value())?)
        .bind(session.start_time())
        .bind(session.end_time())
        .bind(session.duration_secs())
        .bind(session.points_earned())
        .bind(session.is_active())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            // the partial unique index trips when another active row exists
            Err(e) if is_unique_violation(&e) => Err(LedgerError::Conflict),
            Err(e) => Err(conn(e)),
        }
    }

    async fn get_session(&self, id: StudySessionId) -> Result<StudySession, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, start_time, end_time, duration, points_earned, is_active
                FROM study_sessions
                WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(LedgerError::NotFound)?;

        map_session_row(&row)
    }

    async fn update_session(&self, session: &StudySession) -> Result<(), LedgerError> {
        let res = sqlx::query(
            r"
                UPDATE study_sessions
                SET end_time = ?2, duration = ?3, points_earned = ?4, is_active = ?5
                WHERE id = ?1
            ",
        )
        .bind(session.id().to_string())
        .bind(session.end_time())
        .bind(session.duration_secs())
        .bind(session.points_earned())
        .bind(session.is_active())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    async fn active_session(&self, user: UserId) -> Result<Option<StudySession>, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT id, user_id, start_time, end_time, duration, points_earned, is_active
                FROM study_sessions
                WHERE user_id = ?1 AND is_active = 1
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_session_row).transpose()
    }
}
