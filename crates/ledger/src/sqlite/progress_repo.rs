use sqlx::Row;

use study_core::model::{SectionProgress, Subject, UserId};

use super::SqliteLedger;
use super::mapping::{conn, id_i64, ser, subject_from_str, u32_from_i64, user_id_from_i64};
use crate::repository::{LedgerError, ProgressLedger};

fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<SectionProgress, LedgerError> {
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let section_number = u32_from_i64(
        "section_number",
        row.try_get::<i64, _>("section_number").map_err(ser)?,
    )?;
    let completed_questions = u32_from_i64(
        "completed_questions",
        row.try_get::<i64, _>("completed_questions").map_err(ser)?,
    )?;
    let is_completed: bool = row.try_get("is_completed").map_err(ser)?;

    Ok(SectionProgress::from_persisted(
        user_id,
        subject,
        section_number,
        completed_questions,
        is_completed,
    ))
}

#[async_trait::async_trait]
impl ProgressLedger for SqliteLedger {
    async fn upsert_progress(&self, progress: &SectionProgress) -> Result<(), LedgerError> {
        sqlx::query(
            r"
                INSERT INTO section_progress (
                    user_id, subject, section_number, completed_questions, is_completed
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(user_id, subject, section_number) DO UPDATE SET
                    completed_questions = excluded.completed_questions,
                    is_completed = excluded.is_completed
            ",
        )
        .bind(id_i64("user_id", progress.user_id().value())?)
        .bind(progress.subject().as_str())
        .bind(i64::from(progress.section_number()))
        .bind(i64::from(progress.completed_questions()))
        .bind(progress.is_completed())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_progress(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Option<SectionProgress>, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT user_id, subject, section_number, completed_questions, is_completed
                FROM section_progress
                WHERE user_id = ?1 AND subject = ?2 AND section_number = ?3
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(subject.as_str())
        .bind(i64::from(section_number))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn progress_for_subject(
        &self,
        user: UserId,
        subject: &Subject,
    ) -> Result<Vec<SectionProgress>, LedgerError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, subject, section_number, completed_questions, is_completed
                FROM section_progress
                WHERE user_id = ?1 AND subject = ?2
                ORDER BY section_number
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }
}
