use std::sync::Arc;

use quiz_core::model::{Advance, Question, QuestionCount, QuestionId, UnitName, UserId};
use quiz_core::time::fixed_now;
use services::{Clock, QuizLoopService, ReportService};
use storage::repository::{
    InMemoryRepository, QuestionRepository, QuizResultRepository, Storage, StudyLogRepository,
};

fn unit(name: &str) -> UnitName {
    UnitName::new(name).unwrap()
}

async fn seed(repo: &dyn QuestionRepository) {
    let rows = [(1, "A", "alpha"), (2, "B", "Paris"), (3, "B", "3/4"), (4, "C", "gamma")];
    for (id, unit_name, answer) in rows {
        let question = Question::input(
            QuestionId::new(id),
            unit(unit_name),
            format!("Question {id}"),
            vec![answer.to_string()],
            format!("The answer is {answer}."),
        )
        .unwrap();
        repo.upsert_question(&question).await.unwrap();
    }
}

fn answer_for(question: &Question) -> String {
    question.display_answer()
}

#[tokio::test]
async fn quiz_loop_persists_logs_and_result() {
    let repo = InMemoryRepository::new();
    seed(&repo).await;

    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    );
    let user = UserId::random();

    let mut session = loop_svc
        .start_session(user, &[unit("B")], QuestionCount::All)
        .await
        .unwrap();
    assert_eq!(session.progress().total, 2);
    assert!(
        session
            .quiz()
            .questions()
            .iter()
            .all(|q| q.unit().as_str() == "B")
    );

    // First question: one wrong answer, then the right one.
    let first = session.current_question().unwrap().clone();
    let judged = loop_svc.answer_current(&mut session, "wrong").unwrap();
    assert!(!judged.correct);
    assert_eq!(session.quiz().mistake_count(), 1);
    loop_svc.review_explanation(&mut session).unwrap();
    loop_svc
        .answer_current(&mut session, &answer_for(&first))
        .unwrap();
    let step = loop_svc.advance(&mut session).await.unwrap();
    assert_eq!(step.advance, Advance::Next { position: 1 });
    assert_eq!(step.logs_written, 1);
    assert!(step.result_id.is_none());

    let second = session.current_question().unwrap().clone();
    loop_svc
        .answer_current(&mut session, &answer_for(&second))
        .unwrap();
    let step = loop_svc.advance(&mut session).await.unwrap();
    assert_eq!(step.advance, Advance::Complete);

    let score = session.score();
    assert_eq!(score.raw_percent, 50);
    assert_eq!(score.final_percent, 50);
    assert_eq!(score.mistakes.len(), 1);
    assert_eq!(score.mistakes[0].first_wrong_answer, "wrong");

    let logs = repo.logs_for_user(user).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert!(!logs[0].correct);
    assert!(logs[0].explanation_reviewed);
    assert!(logs[1].correct);

    let result_id = step.result_id.expect("result persisted");
    let result = repo.get_result(result_id).await.unwrap();
    assert_eq!(result.total(), 2);
    assert_eq!(result.correct(), 1);
    assert_eq!(result.units(), &[unit("B")]);

    let rows = ReportService::new(Arc::new(repo.clone()))
        .unit_summaries(user)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].accuracy, 50);
}

#[tokio::test]
async fn hints_and_timeouts_flow_into_score_and_logs() {
    let storage = Storage::in_memory();
    seed(storage.questions.as_ref()).await;

    let loop_svc = QuizLoopService::from_storage(Clock::fixed(fixed_now()), &storage)
        .with_shuffle(false);
    let user = UserId::random();

    let mut session = loop_svc
        .start_session(user, &[unit("A"), unit("C")], QuestionCount::Limit(1))
        .await
        .unwrap();
    assert_eq!(session.progress().total, 1);

    let hint = loop_svc.hint_current(&mut session).unwrap();
    assert_eq!(hint.level, 1);
    loop_svc.hint_current(&mut session).unwrap();
    loop_svc.timeout_current(&mut session).unwrap();
    loop_svc.answer_current(&mut session, "ALPHA").unwrap();
    loop_svc.advance(&mut session).await.unwrap();

    let score = session.score();
    assert_eq!(score.raw_percent, 0);
    assert_eq!(score.hint_penalty_percent, 7);
    assert_eq!(score.final_percent, 0);

    let logs = storage.study_logs.logs_for_user(user).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].timed_out);
    assert!(!logs[0].correct);
}
