use chrono::{DateTime, Utc};
use sqlx::Row;

use study_core::model::{QuizResult, RecordedAnswer, UserId};

use super::SqliteLedger;
use super::mapping::{conn, id_i64, ser, subject_from_str, u32_from_i64, user_id_from_i64};
use crate::repository::{LedgerError, QuizResultLedger};

fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, LedgerError> {
    let user_id = user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?;
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let section_number = u32_from_i64(
        "section_number",
        row.try_get::<i64, _>("section_number").map_err(ser)?,
    )?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let points_earned: i64 = row.try_get("points_earned").map_err(ser)?;
    let time_taken: i64 = row.try_get("time_taken").map_err(ser)?;
    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<RecordedAnswer> = serde_json::from_str(&answers_json).map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;

    QuizResult::new(
        user_id,
        subject,
        section_number,
        score,
        total_questions,
        points_earned,
        time_taken,
        answers,
        completed_at,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl QuizResultLedger for SqliteLedger {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, LedgerError> {
        let answers = serde_json::to_string(result.answers()).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    user_id, subject, section_number, score, total_questions,
                    points_earned, time_taken, answers, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(id_i64("user_id", result.user_id().value())?)
        .bind(result.subject().as_str())
        .bind(i64::from(result.section_number()))
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total_questions()))
        .bind(result.points_earned())
        .bind(result.time_taken_secs())
        .bind(answers)
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn results_for_user(&self, user: UserId) -> Result<Vec<QuizResult>, LedgerError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, subject, section_number, score, total_questions,
                       points_earned, time_taken, answers, completed_at
                FROM quiz_results
                WHERE user_id = ?1
                ORDER BY id
            ",
        )
        .bind(id_i64("user_id", user.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
