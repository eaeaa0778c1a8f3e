use sqlx::{Row, SqlitePool};

use study_core::model::{Question, Section, Subject};

use super::SqliteLedger;
use super::mapping::{
    conn, id_i64, question_id_from_i64, ser, subject_from_str, u32_from_i64, usize_from_i64,
};
use crate::repository::{LedgerError, QuestionLedger};

fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, LedgerError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let section_number = u32_from_i64(
        "section_number",
        row.try_get::<i64, _>("section_number").map_err(ser)?,
    )?;
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct_answer = usize_from_i64(
        "correct_answer",
        row.try_get::<i64, _>("correct_answer").map_err(ser)?,
    )?;

    Question::from_persisted(id, subject, section_number, prompt, options, correct_answer)
        .map_err(ser)
}

fn map_section_row(row: &sqlx::sqlite::SqliteRow) -> Result<Section, LedgerError> {
    let subject = subject_from_str(&row.try_get::<String, _>("subject").map_err(ser)?)?;
    let section_number = u32_from_i64(
        "section_number",
        row.try_get::<i64, _>("section_number").map_err(ser)?,
    )?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;

    Section::new(subject, section_number, total_questions).map_err(ser)
}

pub(super) async fn insert_question(
    pool: &SqlitePool,
    question: &Question,
) -> Result<(), LedgerError> {
    let options = serde_json::to_string(question.options()).map_err(ser)?;
    let correct = i64::try_from(question.correct_answer()).map_err(ser)?;

    sqlx::query(
        r"
            INSERT INTO questions (id, subject, section_number, prompt, options, correct_answer)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(id_i64("question_id", question.id().value())?)
    .bind(question.subject().as_str())
    .bind(i64::from(question.section_number()))
    .bind(question.prompt())
    .bind(options)
    .bind(correct)
    .execute(pool)
    .await
    .map_err(conn)?;

    Ok(())
}

pub(super) async fn insert_section(pool: &SqlitePool, section: &Section) -> Result<(), LedgerError> {
    sqlx::query(
        r"
            INSERT INTO sections (subject, section_number, total_questions)
            VALUES (?1, ?2, ?3)
        ",
    )
    .bind(section.subject().as_str())
    .bind(i64::from(section.section_number()))
    .bind(i64::from(section.total_questions()))
    .execute(pool)
    .await
    .map_err(conn)?;

    Ok(())
}

#[async_trait::async_trait]
impl QuestionLedger for SqliteLedger {
    async fn questions_in_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Vec<Question>, LedgerError> {
        let rows = sqlx::query(
            r"
                SELECT id, subject, section_number, prompt, options, correct_answer
                FROM questions
                WHERE subject = ?1 AND section_number = ?2 AND is_active = 1
            ",
        )
        .bind(subject.as_str())
        .bind(i64::from(section_number))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn sections(&self, subject: &Subject) -> Result<Vec<Section>, LedgerError> {
        let rows = sqlx::query(
            r"
                SELECT subject, section_number, total_questions
                FROM sections
                WHERE subject = ?1
                ORDER BY section_number
            ",
        )
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_section_row).collect()
    }

    async fn get_section(
        &self,
        subject: &Subject,
        section_number: u32,
    ) -> Result<Section, LedgerError> {
        let row = sqlx::query(
            r"
                SELECT subject, section_number, total_questions
                FROM sections
                WHERE subject = ?1 AND section_number = ?2
            ",
        )
        .bind(subject.as_str())
        .bind(i64::from(section_number))
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(LedgerError::NotFound)?;

        map_section_row(&row)
    }
}
