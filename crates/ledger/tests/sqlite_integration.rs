use chrono::Duration;

use ledger::repository::{
    AnswerLedger, LedgerError, ProgressLedger, QuestionLedger, QuizResultLedger,
    StudySessionLedger, UserLedger,
};
use ledger::sqlite::SqliteLedger;
use study_core::model::{
    AnsweredQuestion, PointCategory, Question, QuestionId, QuizResult, RecordedAnswer, Section,
    SectionProgress, StudySession, StudySessionId, Subject, User, UserId,
};
use study_core::time::fixed_now;

async fn connect(name: &str) -> SqliteLedger {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteLedger::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn english() -> Subject {
    Subject::new("english").unwrap()
}

fn build_user(id: u64) -> User {
    User::new(UserId::new(id), format!("user-{id}"), fixed_now()).unwrap()
}

fn build_question(id: u64, section: u32, correct: usize) -> Question {
    Question::new(
        QuestionId::new(id),
        english(),
        section,
        format!("Question {id}"),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct,
    )
    .unwrap()
}

#[tokio::test]
async fn user_roundtrip_and_atomic_point_increments() {
    let repo = connect("memdb_users").await;

    repo.upsert_user(&build_user(1)).await.unwrap();
    repo.add_points(UserId::new(1), PointCategory::Quiz, 30)
        .await
        .unwrap();
    repo.add_points(UserId::new(1), PointCategory::Counter, 7)
        .await
        .unwrap();
    repo.add_study_hours(UserId::new(1), 0.5).await.unwrap();
    repo.touch_last_active(UserId::new(1), fixed_now() + Duration::seconds(60))
        .await
        .unwrap();

    let user = repo.get_user(UserId::new(1)).await.unwrap();
    assert_eq!(user.points_in(PointCategory::Quiz), 30);
    assert_eq!(user.points_in(PointCategory::Counter), 7);
    assert_eq!(user.total_points(), 37);
    assert!((user.study_hours() - 0.5).abs() < f64::EPSILON);
    assert_eq!(user.last_active(), fixed_now() + Duration::seconds(60));

    let found = repo.find_by_handle("user-1").await.unwrap();
    assert!(found.is_some());
    assert!(repo.find_by_handle("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn add_points_to_unknown_user_is_not_found() {
    let repo = connect("memdb_user_missing").await;

    let err = repo
        .add_points(UserId::new(99), PointCategory::Quiz, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
}

#[tokio::test]
async fn one_active_session_per_user_is_enforced() {
    let repo = connect("memdb_sessions").await;
    repo.upsert_user(&build_user(1)).await.unwrap();
    repo.upsert_user(&build_user(2)).await.unwrap();

    let first = StudySession::open(StudySessionId::generate(), UserId::new(1), fixed_now());
    repo.create_session(&first).await.unwrap();

    let second = StudySession::open(StudySessionId::generate(), UserId::new(1), fixed_now());
    let err = repo.create_session(&second).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict));

    // other users are unaffected
    let other = StudySession::open(StudySessionId::generate(), UserId::new(2), fixed_now());
    repo.create_session(&other).await.unwrap();

    // closing the first session frees the slot
    let mut closed = first.clone();
    closed.close(fixed_now() + Duration::seconds(34), 34, 5);
    repo.update_session(&closed).await.unwrap();
    assert!(repo.active_session(UserId::new(1)).await.unwrap().is_none());

    let replacement = StudySession::open(StudySessionId::generate(), UserId::new(1), fixed_now());
    repo.create_session(&replacement).await.unwrap();

    let fetched = repo.get_session(closed.id()).await.unwrap();
    assert!(!fetched.is_active());
    assert_eq!(fetched.duration_secs(), 34);
    assert_eq!(fetched.points_earned(), 6);
}

#[tokio::test]
async fn update_of_unknown_session_is_not_found() {
    let repo = connect("memdb_session_missing").await;

    let ghost = StudySession::open(StudySessionId::generate(), UserId::new(1), fixed_now());
    let err = repo.update_session(&ghost).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
}

#[tokio::test]
async fn question_content_roundtrip() {
    let repo = connect("memdb_questions").await;

    repo.insert_section(&Section::new(english(), 1, 2).unwrap())
        .await
        .unwrap();
    repo.insert_section(&Section::new(english(), 2, 1).unwrap())
        .await
        .unwrap();
    repo.insert_question(&build_question(1, 1, 0)).await.unwrap();
    repo.insert_question(&build_question(2, 1, 3)).await.unwrap();
    repo.insert_question(&build_question(3, 2, 1)).await.unwrap();

    let questions = repo.questions_in_section(&english(), 1).await.unwrap();
    assert_eq!(questions.len(), 2);
    let q2 = questions.iter().find(|q| q.id() == QuestionId::new(2));
    assert_eq!(q2.unwrap().correct_answer(), 3);

    let sections = repo.sections(&english()).await.unwrap();
    let numbers: Vec<u32> = sections.iter().map(Section::section_number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let section = repo.get_section(&english(), 2).await.unwrap();
    assert_eq!(section.total_questions(), 1);

    let err = repo.get_section(&english(), 9).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
}

#[tokio::test]
async fn answer_upsert_is_last_write_wins() {
    let repo = connect("memdb_answers").await;
    repo.upsert_user(&build_user(1)).await.unwrap();
    repo.insert_question(&build_question(1, 1, 0)).await.unwrap();
    repo.insert_question(&build_question(2, 1, 0)).await.unwrap();
    repo.insert_question(&build_question(3, 2, 0)).await.unwrap();
    let user = UserId::new(1);

    for id in 1..=3 {
        repo.upsert_answer(&AnsweredQuestion::new(
            user,
            QuestionId::new(id),
            true,
            fixed_now(),
        ))
        .await
        .unwrap();
    }
    assert_eq!(repo.correct_question_ids(user).await.unwrap().len(), 3);
    assert_eq!(
        repo.correct_count_in_section(user, &english(), 1)
            .await
            .unwrap(),
        2
    );

    // a later wrong answer downgrades the stored outcome
    repo.upsert_answer(&AnsweredQuestion::new(
        user,
        QuestionId::new(2),
        false,
        fixed_now() + Duration::seconds(10),
    ))
    .await
    .unwrap();

    let correct = repo.correct_question_ids(user).await.unwrap();
    assert!(!correct.contains(&QuestionId::new(2)));
    assert_eq!(
        repo.correct_count_in_section(user, &english(), 1)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn progress_rows_upsert_and_list_in_order() {
    let repo = connect("memdb_progress").await;
    repo.upsert_user(&build_user(1)).await.unwrap();
    let user = UserId::new(1);

    repo.upsert_progress(&SectionProgress::derive(user, english(), 2, 5, 15))
        .await
        .unwrap();
    repo.upsert_progress(&SectionProgress::derive(user, english(), 1, 15, 15))
        .await
        .unwrap();
    // second write for the same section overwrites the first
    repo.upsert_progress(&SectionProgress::derive(user, english(), 2, 9, 15))
        .await
        .unwrap();

    let rows = repo.progress_for_subject(user, &english()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].section_number(), 1);
    assert!(rows[0].is_completed());
    assert_eq!(rows[1].completed_questions(), 9);
    assert!(!rows[1].is_completed());

    let one = repo.get_progress(user, &english(), 2).await.unwrap();
    assert_eq!(one.unwrap().completed_questions(), 9);
    assert!(repo.get_progress(user, &english(), 3).await.unwrap().is_none());
}

#[tokio::test]
async fn quiz_results_append_and_read_back() {
    let repo = connect("memdb_results").await;
    repo.upsert_user(&build_user(1)).await.unwrap();
    let user = UserId::new(1);

    let answers = vec![
        RecordedAnswer {
            question_id: QuestionId::new(1),
            prompt: "Question 1".into(),
            selected: Some(0),
            selected_text: Some("a".into()),
            correct_text: "a".into(),
            is_correct: true,
        },
        RecordedAnswer {
            question_id: QuestionId::new(2),
            prompt: "Question 2".into(),
            selected: None,
            selected_text: None,
            correct_text: "b".into(),
            is_correct: false,
        },
    ];
    let result = QuizResult::new(
        user,
        english(),
        1,
        1,
        2,
        10,
        120,
        answers,
        fixed_now() + Duration::seconds(120),
    )
    .unwrap();

    let first_id = repo.append_result(&result).await.unwrap();
    let second_id = repo.append_result(&result).await.unwrap();
    assert!(second_id > first_id);

    let stored = repo.results_for_user(user).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].score(), 1);
    assert_eq!(stored[0].answers().len(), 2);
    assert_eq!(stored[0].answers()[1].selected, None);
    assert!(repo.results_for_user(UserId::new(2)).await.unwrap().is_empty());
}
