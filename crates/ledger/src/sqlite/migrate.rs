use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: users, study sessions, question/section content,
/// answered questions, section progress, quiz results, and indexes.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    handle TEXT NOT NULL UNIQUE,
                    counter_points INTEGER NOT NULL DEFAULT 0 CHECK (counter_points >= 0),
                    quiz_points INTEGER NOT NULL DEFAULT 0 CHECK (quiz_points >= 0),
                    task_points INTEGER NOT NULL DEFAULT 0 CHECK (task_points >= 0),
                    referral_points INTEGER NOT NULL DEFAULT 0 CHECK (referral_points >= 0),
                    total_points INTEGER NOT NULL DEFAULT 0 CHECK (total_points >= 0),
                    study_hours REAL NOT NULL DEFAULT 0 CHECK (study_hours >= 0),
                    last_active TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS study_sessions (
                    id TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT,
                    duration INTEGER NOT NULL DEFAULT 0 CHECK (duration >= 0),
                    points_earned INTEGER NOT NULL DEFAULT 0 CHECK (points_earned >= 0),
                    is_active INTEGER NOT NULL DEFAULT 1,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // At most one active session per user; the row schema alone cannot
        // express this.
        sqlx::query(
            r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_study_sessions_one_active
                ON study_sessions(user_id) WHERE is_active = 1;
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY,
                    subject TEXT NOT NULL,
                    section_number INTEGER NOT NULL CHECK (section_number >= 1),
                    prompt TEXT NOT NULL,
                    options TEXT NOT NULL,
                    correct_answer INTEGER NOT NULL CHECK (correct_answer >= 0),
                    is_active INTEGER NOT NULL DEFAULT 1
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_section
                ON questions(subject, section_number);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sections (
                    subject TEXT NOT NULL,
                    section_number INTEGER NOT NULL CHECK (section_number >= 1),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 1),
                    PRIMARY KEY (subject, section_number)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS answered_questions (
                    user_id INTEGER NOT NULL,
                    question_id INTEGER NOT NULL,
                    is_correct INTEGER NOT NULL,
                    answered_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, question_id),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS section_progress (
                    user_id INTEGER NOT NULL,
                    subject TEXT NOT NULL,
                    section_number INTEGER NOT NULL CHECK (section_number >= 1),
                    completed_questions INTEGER NOT NULL CHECK (completed_questions >= 0),
                    is_completed INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (user_id, subject, section_number),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_results (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    subject TEXT NOT NULL,
                    section_number INTEGER NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
                    points_earned INTEGER NOT NULL CHECK (points_earned >= 0),
                    time_taken INTEGER NOT NULL CHECK (time_taken >= 0),
                    answers TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (1, ?1)")
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
