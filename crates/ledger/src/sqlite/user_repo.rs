use chrono::{DateTime, Utc};
use sqlx::Row;

use study_core::model::{PointCategory, User, UserId};

use super::SqliteLedger;
use super::mapping::{conn, id_i64, ser, user_id_from_i64};
use crate::repository::{LedgerError, UserLedger};

fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, LedgerError> {
    let id = user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let handle: String = row.try_get("handle").map_err(ser)?;
    let counter_points: i64 = row.try_get("counter_points").map_err(ser)?;
    let quiz_points: i64 = row.try_get("quiz_points").map_err(ser)?;
    let task_points: i64 = row.try_get("task_points").map_err(ser)?;
    let referral_points: i64 = row.try_get("referral_points").map_err(ser)?;
    let total_points: i64 = row.try_get("total_points").map_err(ser)?;
    let study_hours: f64 = row.try_get("study_hours").map_err(ser)?;
    let last_active: DateTime<Utc> = row.try_get("last_active").map_err(ser)?;

    User::from_persisted(
        id,
        handle,
        counter_points,
        quiz_points,
        task_points,
        referral_points,
        total_points,
        study_hours,
        last_active,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl UserLedger for SqliteLedger {
    async fn upsert_user(&self, user: &User) -> Result<(), LedgerError> {
        let id = id_i64("user_id", user.id().value())?;

        sqlx::query(
            r"
                INSERT INTO users (
                    id, handle, counter_points, quiz_points, task_points,
                    referral_points, total_points, study_hours, last_active
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    handle = excluded.handle,
                    counter_points = excluded.counter_points,
                    quiz_points = excluded.quiz_points,
                    task_points = excluded.task_points,
                    referral_points = excluded.referral_points,
                    total_points = excluded.total_points,
                    study_hours = excluded.study_hours,
                    last_active = excluded.last_active
            ",
        )
        .bind(id)
        .bind(user.handle())
        .bind(user.points_in(PointCategory::Counter))
        .bind(user.points_in(PointCategory::Quiz))
        .bind(user.points_in(PointCategory::Task))
        .bind(user.points_in(PointCategory::Referral))
        .bind(user.total_points())
        .bind(user.study_hours())
        .bind(user.last_active())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT id, handle, counter_points, quiz_points, task_points,
                       referral_points, total_points, study_hours, last_active
                FROM users
                WHERE id = ?1
            ",
        )
        .bind(id_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(LedgerError::NotFound)?;

        map_user_row(&row)
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT id, handle, counter_points, quiz_points, task_points,
                       referral_points, total_points, study_hours, last_active
                FROM users
                WHERE handle = ?1
            ",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn add_points(
        &self,
        id: UserId,
        category: PointCategory,
        amount: i64,
    ) -> Result<(), LedgerError> {
        // One row-level UPDATE keeps the category and the denormalized total
        // consistent without a read-modify-write cycle.
        let sql = match category {
            PointCategory::Counter => {
                r"UPDATE users
                  SET counter_points = counter_points + ?1, total_points = total_points + ?1
                  WHERE id = ?2"
            }
            PointCategory::Quiz => {
                r"UPDATE users
                  SET quiz_points = quiz_points + ?1, total_points = total_points + ?1
                  WHERE id = ?2"
            }
            PointCategory::Task => {
                r"UPDATE users
                  SET task_points = task_points + ?1, total_points = total_points + ?1
                  WHERE id = ?2"
            }
            PointCategory::Referral => {
                r"UPDATE users
                  SET referral_points = referral_points + ?1, total_points = total_points + ?1
                  WHERE id = ?2"
            }
        };

        let res = sqlx::query(sql)
            .bind(amount)
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    async fn add_study_hours(&self, id: UserId, hours: f64) -> Result<(), LedgerError> {
        let res = sqlx::query("UPDATE users SET study_hours = study_hours + ?1 WHERE id = ?2")
            .bind(hours)
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }

    async fn touch_last_active(&self, id: UserId, at: DateTime<Utc>) -> Result<(), LedgerError> {
        let res = sqlx::query("UPDATE users SET last_active = ?1 WHERE id = ?2")
            .bind(at)
            .bind(id_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }
}
