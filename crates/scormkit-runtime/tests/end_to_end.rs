//! End-to-end tests: adapter sessions interleaved with quiz submissions.

use std::sync::Arc;

use uuid::Uuid;

use scormkit_core::aggregate::{Aggregator, AggregatorConfig, QuizReport};
use scormkit_core::model::{Enrollment, EnrollmentStatus, LearnerIdentity};
use scormkit_core::traits::PersistenceGateway;
use scormkit_core::vars::SCORE_RAW;
use scormkit_gateway::MemoryGateway;
use scormkit_runtime::{EnrollmentBinding, ScormAdapter};

fn seeded_gateway() -> (Arc<MemoryGateway>, Enrollment) {
    let gateway = Arc::new(MemoryGateway::new());
    let enrollment = Enrollment {
        id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        course_id: None,
        status: EnrollmentStatus::NotStarted,
        quiz_score: None,
        scorm_score: None,
        best_score: 0,
        weights: None,
    };
    gateway.insert_enrollment(enrollment.clone());
    (gateway, enrollment)
}

fn adapter(gateway: &Arc<MemoryGateway>, enrollment: &Enrollment) -> ScormAdapter {
    ScormAdapter::new(
        &LearnerIdentity::default(),
        Some(EnrollmentBinding {
            enrollment_id: enrollment.id,
            course_id: None,
        }),
        Arc::clone(gateway) as Arc<dyn PersistenceGateway>,
        AggregatorConfig::default(),
    )
}

fn aggregator(gateway: &Arc<MemoryGateway>) -> Aggregator {
    Aggregator::new(
        Arc::clone(gateway) as Arc<dyn PersistenceGateway>,
        AggregatorConfig::default(),
    )
}

async fn scorm_session(adapter: &ScormAdapter) {
    adapter.initialize("");
    adapter.set_value(SCORE_RAW, "85");
    adapter.finish("").await;
}

/// The quiz subsystem records its own best on the row, then triggers a
/// recompute through the aggregator.
async fn quiz_submission(gateway: &Arc<MemoryGateway>, quiz: &Aggregator, row: &Enrollment) {
    quiz.ingest_quiz(
        row.id,
        &QuizReport {
            score: 90.0,
            finalized: true,
        },
    )
    .await
    .unwrap();
    let mut updated = gateway.enrollment(row.id).unwrap();
    updated.quiz_score = Some(90.0);
    gateway.insert_enrollment(updated);
}

/// Run one package session reporting a score of 85 and a finalized quiz
/// submission of 90, in the given order; return the final enrollment row.
async fn run_interleaving(scorm_first: bool) -> Enrollment {
    let (gateway, row) = seeded_gateway();
    let session = adapter(&gateway, &row);
    let quiz = aggregator(&gateway);

    if scorm_first {
        scorm_session(&session).await;
        quiz_submission(&gateway, &quiz, &row).await;
    } else {
        quiz_submission(&gateway, &quiz, &row).await;
        scorm_session(&session).await;
    }

    gateway.enrollment(row.id).unwrap()
}

#[tokio::test]
async fn final_best_score_is_independent_of_interleaving() {
    let scorm_then_quiz = run_interleaving(true).await;
    let quiz_then_scorm = run_interleaving(false).await;

    assert_eq!(scorm_then_quiz.best_score, 89);
    assert_eq!(quiz_then_scorm.best_score, 89);
    assert_eq!(scorm_then_quiz.status, EnrollmentStatus::Completed);
    assert_eq!(quiz_then_scorm.status, EnrollmentStatus::Completed);
}

#[tokio::test]
async fn repeated_attempts_keep_the_best_outcome() {
    let (gateway, mut row) = seeded_gateway();
    row.quiz_score = Some(90.0);
    gateway.insert_enrollment(row.clone());

    // First attempt scores well and completes.
    let first = adapter(&gateway, &row);
    first.set_value(SCORE_RAW, "92");
    first.finish("").await;
    let after_first = gateway.enrollment(row.id).unwrap();
    assert_eq!(after_first.status, EnrollmentStatus::Completed);
    assert_eq!(after_first.best_score, 91); // round(90 * 0.7 + 92 * 0.3)

    // A later, worse attempt neither lowers the best nor reverts completion.
    let second = adapter(&gateway, &row);
    second.set_value(SCORE_RAW, "10");
    second.finish("").await;
    let after_second = gateway.enrollment(row.id).unwrap();
    assert_eq!(after_second.status, EnrollmentStatus::Completed);
    assert_eq!(after_second.best_score, 91);
    assert_eq!(after_second.scorm_score, Some(92.0));
}
