use std::collections::HashSet;

use sqlx::Row;

use study_core::model::{AnsweredQuestion, QuestionId, Subject, UserId};

use super::SqliteLedger;
use super::mapping::{conn, id_i64, question_id_from_i64, ser, u32_from_i64};
use crate::repository::{AnswerLedger, LedgerError};

#[async_trait::async_trait]
impl AnswerLedger for SqliteLedger {
    async fn upsert_answer(&self, answer: &AnsweredQuestion) -> Result<(), LedgerError> {
        sqlx::query(
            r"
                INSERT INTO answered_questions (user_id, question_id, is_correct, answered_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, question_id) DO UPDATE SET
                    is_correct = excluded.is_correct,
                    answered_at = excluded.answered_at
            ",
        )
        .bind(id_i64("user_id", answer.user_id().value())?)
        .bind(id_i64("question_id", answer.question_id().value())?)
        .bind(answer.is_correct())
        .bind(answer.answered_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn correct_question_ids(&self, user: UserId) -> Result<HashSet<QuestionId>, LedgerError> {
        let rows = sqlx::query(
            r"
                SELECT question_id
                FROM answered_questions
                WHERE user_id = ?1 AND is_correct = 1
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?))
            .collect()
    }

    async fn correct_count_in_section(
        &self,
        user: UserId,
        subject: &Subject,
        section_number: u32,
    ) -> Result<u32, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT COUNT(*) AS correct_count
                FROM answered_questions a
                JOIN questions q ON q.id = a.question_id
                WHERE a.user_id = ?1
                  AND a.is_correct = 1
                  AND q.subject = ?2
                  AND q.section_number = ?3
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .bind(subject.as_str())
        .bind(i64::from(section_number))
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )
    }
}
