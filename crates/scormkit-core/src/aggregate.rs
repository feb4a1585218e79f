//! Gateway-driven score aggregation.
//!
//! The aggregator is the only writer of the enrollment row: it reads the
//! current record, merges the triggering channel's best, recomputes the
//! weighted best score, and writes back only when something changed. The
//! two score producers (quiz subsystem and SCORM adapter) never touch the
//! row directly, which eliminates the lost-update race between them.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::GatewayError;
use crate::model::{EnrollmentId, EnrollmentStatus};
use crate::score::{
    completion_decision, merge_best, weighted_best_score, DEFAULT_PASSING_THRESHOLD,
};
use crate::traits::PersistenceGateway;

/// Configuration for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Combined score at or above which a terminal signal completes the
    /// enrollment.
    pub passing_threshold: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            passing_threshold: DEFAULT_PASSING_THRESHOLD,
        }
    }
}

/// A score report originating from a SCORM checkpoint.
#[derive(Debug, Clone)]
pub struct ScormReport {
    /// Raw score parsed from the runtime variables (0 on parse failure).
    pub score: f64,
    /// Lesson status string, verbatim.
    pub lesson_status: String,
    /// Whether the checkpoint was taken by `Finish`.
    pub terminal: bool,
}

impl ScormReport {
    /// A `Finish` checkpoint or a passed/completed lesson status counts as
    /// a terminal signal for the completion rule.
    pub fn is_terminal_signal(&self) -> bool {
        self.terminal
            || matches!(self.lesson_status.as_str(), "passed" | "completed")
    }
}

/// A score report originating from the quiz subsystem.
#[derive(Debug, Clone)]
pub struct QuizReport {
    /// Quiz score, 0–100.
    pub score: f64,
    /// Whether the submission was finalized.
    pub finalized: bool,
}

/// The outcome of one recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    /// Best quiz score after the merge.
    pub quiz_best: Option<f64>,
    /// Best SCORM score after the merge.
    pub scorm_best: Option<f64>,
    /// Derived combined score.
    pub best_score: u32,
    /// Enrollment status after the recompute.
    pub status: EnrollmentStatus,
    /// Whether the recompute wrote anything back.
    pub changed: bool,
}

/// Combines the two best-tracked score channels into one enrollment state.
pub struct Aggregator {
    gateway: Arc<dyn PersistenceGateway>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, config: AggregatorConfig) -> Self {
        Self { gateway, config }
    }

    /// Recompute after a SCORM checkpoint reported a score.
    pub async fn ingest_scorm(
        &self,
        enrollment_id: EnrollmentId,
        report: &ScormReport,
    ) -> Result<AggregateOutcome, GatewayError> {
        self.recompute(
            enrollment_id,
            Channel::Scorm(report.score),
            report.is_terminal_signal(),
        )
        .await
    }

    /// Recompute after a quiz submission reported a score.
    pub async fn ingest_quiz(
        &self,
        enrollment_id: EnrollmentId,
        report: &QuizReport,
    ) -> Result<AggregateOutcome, GatewayError> {
        self.recompute(enrollment_id, Channel::Quiz(report.score), report.finalized)
            .await
    }

    async fn recompute(
        &self,
        enrollment_id: EnrollmentId,
        channel: Channel,
        terminal_seen: bool,
    ) -> Result<AggregateOutcome, GatewayError> {
        let enrollment = self.gateway.read_enrollment(enrollment_id).await?;

        let (quiz_best, scorm_best) = match channel {
            Channel::Quiz(score) => (
                Some(merge_best(enrollment.quiz_score, score)),
                enrollment.scorm_score,
            ),
            Channel::Scorm(score) => (
                enrollment.quiz_score,
                Some(merge_best(enrollment.scorm_score, score)),
            ),
        };

        let best_score = weighted_best_score(quiz_best, scorm_best, enrollment.weights());
        let status = completion_decision(
            enrollment.status,
            best_score,
            self.config.passing_threshold,
            terminal_seen,
        );

        let changed = best_score != enrollment.best_score || status != enrollment.status;
        if changed {
            let new_status = (status != enrollment.status).then_some(status);
            self.gateway
                .update_best_score(enrollment_id, best_score, new_status)
                .await?;
            if status == EnrollmentStatus::Completed && enrollment.status != status {
                info!(%enrollment_id, best_score, "enrollment completed");
            } else {
                debug!(%enrollment_id, best_score, %status, "best score updated");
            }
        } else {
            debug!(%enrollment_id, best_score, "recompute produced no change");
        }

        Ok(AggregateOutcome {
            quiz_best,
            scorm_best,
            best_score,
            status,
            changed,
        })
    }
}

enum Channel {
    Quiz(f64),
    Scorm(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::model::{Enrollment, LogId, NewActivityLog};

    /// Minimal gateway stub holding a single enrollment row.
    struct StubGateway {
        enrollment: Mutex<Enrollment>,
        updates: AtomicU32,
    }

    impl StubGateway {
        fn new(enrollment: Enrollment) -> Self {
            Self {
                enrollment: Mutex::new(enrollment),
                updates: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PersistenceGateway for StubGateway {
        fn name(&self) -> &str {
            "stub"
        }

        async fn append_activity_log(
            &self,
            _entry: &NewActivityLog,
        ) -> Result<LogId, GatewayError> {
            Ok(Uuid::new_v4())
        }

        async fn read_enrollment(&self, _id: EnrollmentId) -> Result<Enrollment, GatewayError> {
            Ok(self.enrollment.lock().unwrap().clone())
        }

        async fn update_best_score(
            &self,
            _id: EnrollmentId,
            best_score: u32,
            new_status: Option<EnrollmentStatus>,
        ) -> Result<(), GatewayError> {
            self.updates.fetch_add(1, Ordering::Relaxed);
            let mut enrollment = self.enrollment.lock().unwrap();
            enrollment.best_score = best_score;
            if let Some(status) = new_status {
                enrollment.status = status;
            }
            Ok(())
        }
    }

    fn enrollment(status: EnrollmentStatus, quiz: Option<f64>, scorm: Option<f64>) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: None,
            status,
            quiz_score: quiz,
            scorm_score: scorm,
            best_score: weighted_best_score(quiz, scorm, Default::default()),
            weights: None,
        }
    }

    fn aggregator(gateway: &Arc<StubGateway>) -> Aggregator {
        Aggregator::new(
            Arc::clone(gateway) as Arc<dyn PersistenceGateway>,
            AggregatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn scorm_finish_completes_above_threshold() {
        let row = enrollment(EnrollmentStatus::InProgress, Some(90.0), None);
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_scorm(
                id,
                &ScormReport {
                    score: 85.0,
                    lesson_status: "incomplete".into(),
                    terminal: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.scorm_best, Some(85.0));
        assert_eq!(outcome.best_score, 89);
        assert_eq!(outcome.status, EnrollmentStatus::Completed);
        assert!(outcome.changed);
    }

    #[tokio::test]
    async fn commit_without_terminal_signal_stays_in_progress() {
        let row = enrollment(EnrollmentStatus::InProgress, Some(90.0), None);
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_scorm(
                id,
                &ScormReport {
                    score: 85.0,
                    lesson_status: "incomplete".into(),
                    terminal: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.best_score, 89);
        assert_eq!(outcome.status, EnrollmentStatus::InProgress);
    }

    #[tokio::test]
    async fn passed_status_counts_as_terminal() {
        let row = enrollment(EnrollmentStatus::InProgress, Some(90.0), None);
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_scorm(
                id,
                &ScormReport {
                    score: 85.0,
                    lesson_status: "passed".into(),
                    terminal: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, EnrollmentStatus::Completed);
    }

    #[tokio::test]
    async fn lower_score_never_erases_best() {
        let row = enrollment(EnrollmentStatus::InProgress, None, Some(85.0));
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_scorm(
                id,
                &ScormReport {
                    score: 40.0,
                    lesson_status: "incomplete".into(),
                    terminal: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.scorm_best, Some(85.0));
        assert!(!outcome.changed);
        assert_eq!(gateway.updates.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn identical_recompute_writes_once() {
        let row = enrollment(EnrollmentStatus::InProgress, Some(90.0), None);
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let report = ScormReport {
            score: 85.0,
            lesson_status: "incomplete".into(),
            terminal: false,
        };
        let first = agg.ingest_scorm(id, &report).await.unwrap();
        let second = agg.ingest_scorm(id, &report).await.unwrap();

        assert_eq!(first.best_score, second.best_score);
        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(gateway.updates.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn completed_does_not_revert_on_lower_recompute() {
        let mut row = enrollment(EnrollmentStatus::Completed, Some(90.0), Some(85.0));
        row.best_score = 89;
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_quiz(
                id,
                &QuizReport {
                    score: 10.0,
                    finalized: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, EnrollmentStatus::Completed);
        assert_eq!(outcome.best_score, 89);
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn quiz_alone_produces_partial_best_score() {
        let row = enrollment(EnrollmentStatus::NotStarted, None, None);
        let id = row.id;
        let gateway = Arc::new(StubGateway::new(row));
        let agg = aggregator(&gateway);

        let outcome = agg
            .ingest_quiz(
                id,
                &QuizReport {
                    score: 90.0,
                    finalized: false,
                },
            )
            .await
            .unwrap();

        // 90 * 0.7 = 63, no scorm activity yet; first activity starts it.
        assert_eq!(outcome.best_score, 63);
        assert_eq!(outcome.status, EnrollmentStatus::InProgress);
    }

    #[tokio::test]
    async fn read_failure_propagates_to_the_caller() {
        struct FailingGateway;

        #[async_trait]
        impl PersistenceGateway for FailingGateway {
            fn name(&self) -> &str {
                "failing"
            }
            async fn append_activity_log(
                &self,
                _entry: &NewActivityLog,
            ) -> Result<LogId, GatewayError> {
                Err(GatewayError::NetworkError("down".into()))
            }
            async fn read_enrollment(
                &self,
                _id: EnrollmentId,
            ) -> Result<Enrollment, GatewayError> {
                Err(GatewayError::NetworkError("down".into()))
            }
            async fn update_best_score(
                &self,
                _id: EnrollmentId,
                _best_score: u32,
                _new_status: Option<EnrollmentStatus>,
            ) -> Result<(), GatewayError> {
                Err(GatewayError::NetworkError("down".into()))
            }
        }

        let agg = Aggregator::new(Arc::new(FailingGateway), AggregatorConfig::default());
        let result = agg
            .ingest_quiz(
                Uuid::new_v4(),
                &QuizReport {
                    score: 50.0,
                    finalized: false,
                },
            )
            .await;
        assert!(result.is_err());
    }
}
