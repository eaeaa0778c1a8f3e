use ledger::repository::{AnswerLedger, InMemoryLedger, QuizResultLedger, UserLedger};
use services::points::PointsAccrual;
use services::quiz::{AnswerOutcome, AttemptStart, QuizAttempt, QuizService};
use services::QuizError;
use study_core::model::{
    AnsweredQuestion, PointCategory, Question, QuestionId, QuizSettings, Section, Subject, User,
    UserId,
};
use study_core::time::{fixed_clock, fixed_now};

const USER: UserId = UserId::new(1);

fn english() -> Subject {
    Subject::new("english").unwrap()
}

fn question(id: u64, section: u32, correct: usize) -> Question {
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

/// Three-question section 1 plus a one-question section 2.
async fn harness() -> (InMemoryLedger, QuizService) {
    let repo = InMemoryLedger::new();
    repo.upsert_user(&User::new(USER, "student", fixed_now()).unwrap())
        .await
        .unwrap();
    repo.seed_section(Section::new(english(), 1, 3).unwrap());
    repo.seed_section(Section::new(english(), 2, 1).unwrap());
    repo.seed_question(question(1, 1, 0));
    repo.seed_question(question(2, 1, 1));
    repo.seed_question(question(3, 1, 2));
    repo.seed_question(question(4, 2, 3));

    let ledger = repo.ledger();
    let service = QuizService::new(
        fixed_clock(),
        ledger.questions,
        ledger.answers,
        ledger.progress,
        ledger.results,
        PointsAccrual::new(ledger.users),
        QuizSettings::default_study(),
    );
    (repo, service)
}

fn started(start: AttemptStart) -> QuizAttempt {
    match start {
        AttemptStart::Started(attempt) => attempt,
        AttemptStart::SectionComplete => panic!("expected a started attempt"),
    }
}

/// Answer the current question, either correctly or deliberately wrong.
async fn answer(
    service: &QuizService,
    attempt: &mut QuizAttempt,
    correctly: bool,
) -> AnswerOutcome {
    let (correct_index, len) = {
        let q = attempt.current_question().unwrap();
        (q.correct_answer(), q.options().len())
    };
    let index = if correctly {
        correct_index
    } else {
        (correct_index + 1) % len
    };
    attempt.select_answer(index).unwrap();
    service.answer_current(attempt).await.unwrap()
}

#[tokio::test]
async fn sampling_excludes_questions_already_correct() {
    let (repo, service) = harness().await;
    repo.upsert_answer(&AnsweredQuestion::new(
        USER,
        QuestionId::new(1),
        true,
        fixed_now(),
    ))
    .await
    .unwrap();

    let mut attempt = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    assert_eq!(attempt.total_questions(), 2);
    while let Some(id) = attempt.current_question().map(|q| q.id()) {
        assert_ne!(id, QuestionId::new(1));
        attempt.select_answer(0).unwrap();
        service.answer_current(&mut attempt).await.unwrap();
    }
}

#[tokio::test]
async fn unknown_section_is_rejected() {
    let (_repo, service) = harness().await;
    assert!(matches!(
        service.start_attempt(USER, &english(), 9).await,
        Err(QuizError::UnknownSection { section_number: 9 })
    ));
}

#[tokio::test]
async fn answer_without_selection_is_an_error() {
    let (_repo, service) = harness().await;
    let mut attempt = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    assert!(matches!(
        service.answer_current(&mut attempt).await,
        Err(QuizError::NoSelection)
    ));
}

#[tokio::test]
async fn two_attempt_progression_completes_the_section() {
    let (repo, service) = harness().await;

    // attempt 1: two of three correct, the middle one wrong
    let mut attempt = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    let mut wrong_id = None;
    let mut last = None;
    for step in 0..3 {
        let correctly = step != 1;
        if !correctly {
            wrong_id = Some(attempt.current_question().unwrap().id());
        }
        last = Some(answer(&service, &mut attempt, correctly).await);
    }
    let summary = last.unwrap().finished.expect("attempt auto-finishes");
    assert_eq!(summary.score, 2);
    assert_eq!(summary.points_earned, 20);
    assert_eq!(summary.progress.completed_questions(), 2);
    assert!(!summary.progress.is_completed());

    let overview = service.section_overview(USER, &english()).await.unwrap();
    assert!(overview[0].is_unlocked);
    assert!(!overview[0].is_completed);
    assert!(!overview[1].is_unlocked);

    // attempt 2 samples only the question still marked wrong
    let mut retry = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    assert_eq!(retry.total_questions(), 1);
    assert_eq!(retry.current_question().unwrap().id(), wrong_id.unwrap());
    let outcome = answer(&service, &mut retry, true).await;
    let summary = outcome.finished.unwrap();
    assert_eq!(summary.progress.completed_questions(), 3);
    assert!(summary.progress.is_completed());

    let overview = service.section_overview(USER, &english()).await.unwrap();
    assert!(overview[0].is_completed);
    assert!(overview[1].is_unlocked);

    // 2 correct then 1 correct, 10 points each, both credits atomic
    let user = repo.get_user(USER).await.unwrap();
    assert_eq!(user.points_in(PointCategory::Quiz), 30);
    assert_eq!(user.total_points(), 30);

    let results = repo.results_for_user(USER).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].score(), 2);
    assert_eq!(results[1].score(), 1);
}

#[tokio::test]
async fn completed_section_short_circuits_without_an_attempt() {
    let (repo, service) = harness().await;
    for id in 1..=3 {
        repo.upsert_answer(&AnsweredQuestion::new(
            USER,
            QuestionId::new(id),
            true,
            fixed_now(),
        ))
        .await
        .unwrap();
    }

    assert!(matches!(
        service.start_attempt(USER, &english(), 1).await.unwrap(),
        AttemptStart::SectionComplete
    ));
    assert!(repo.results_for_user(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn expiry_drains_remaining_questions_as_unanswered() {
    let (repo, mut service) = harness().await;
    let mut attempt = started(service.start_attempt(USER, &english(), 1).await.unwrap());

    answer(&service, &mut attempt, true).await;
    service.clock_mut().advance_secs(300);

    let summary = service.tick(&mut attempt).await.unwrap().unwrap();
    assert_eq!(summary.score, 1);
    assert_eq!(summary.total_questions, 3);
    assert_eq!(attempt.answered_count(), 3);
    assert_eq!(attempt.remaining(), 0);

    let results = repo.results_for_user(USER).await.unwrap();
    assert_eq!(results.len(), 1);
    let unanswered: Vec<_> = results[0]
        .answers()
        .iter()
        .filter(|a| a.selected.is_none())
        .collect();
    assert_eq!(unanswered.len(), 2);
    assert!(unanswered.iter().all(|a| !a.is_correct));
    assert_eq!(results[0].time_taken_secs(), 300);

    // a finished attempt stops ticking
    assert!(service.tick(&mut attempt).await.unwrap().is_none());
}

#[tokio::test]
async fn before_expiry_tick_does_nothing() {
    let (_repo, mut service) = harness().await;
    let mut attempt = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    service.clock_mut().advance_secs(299);
    assert!(service.tick(&mut attempt).await.unwrap().is_none());
    assert_eq!(attempt.remaining(), 3);
}

#[tokio::test]
async fn concurrent_finishes_keep_both_credits() {
    let (repo, service) = harness().await;

    // two tabs sample the same pool before either answers
    let mut a = started(service.start_attempt(USER, &english(), 1).await.unwrap());
    let mut b = started(service.start_attempt(USER, &english(), 1).await.unwrap());

    let mut last_a = None;
    for _ in 0..3 {
        last_a = Some(answer(&service, &mut a, true).await);
    }
    assert_eq!(last_a.unwrap().finished.unwrap().points_earned, 30);

    let mut last_b = None;
    for _ in 0..3 {
        last_b = Some(answer(&service, &mut b, true).await);
    }
    assert_eq!(last_b.unwrap().finished.unwrap().points_earned, 30);

    // both 30-point credits survive the near-simultaneous finishes
    let user = repo.get_user(USER).await.unwrap();
    assert_eq!(user.points_in(PointCategory::Quiz), 60);
    assert_eq!(user.total_points(), 60);

    // progress converges on the authoritative count, not a double-increment
    let overview = service.section_overview(USER, &english()).await.unwrap();
    assert_eq!(overview[0].completed_questions, 3);
}
