//! The `scormkit replay` command.
//!
//! Drives a recorded session script through a fresh adapter instance and
//! reports the resulting activity trail and enrollment state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use scormkit_core::aggregate::AggregatorConfig;
use scormkit_core::error::GatewayError;
use scormkit_core::model::{ActivityLogEntry, Enrollment, EnrollmentId, EnrollmentStatus};
use scormkit_core::script::{parse_script, ApiCall};
use scormkit_core::traits::{
    CheckpointRecord, CompletionEvent, PersistStage, PersistenceGateway, SessionObserver,
};
use scormkit_gateway::{create_gateway, load_config, GatewayConfig, MemoryGateway, ScormkitConfig};
use scormkit_runtime::{EnrollmentBinding, ScormAdapter};

/// Observer that narrates the session to stderr.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_commit(&self, checkpoint: &CheckpointRecord) {
        eprintln!(
            "  checkpoint: status {:?} score {}{}",
            checkpoint.lesson_status,
            checkpoint.score,
            if checkpoint.terminal { " (finish)" } else { "" }
        );
    }

    fn on_finish(&self, event: &CompletionEvent) {
        eprintln!("  finished: status {:?} score {}", event.lesson_status, event.score);
    }

    fn on_persistence_error(&self, stage: PersistStage, error: &GatewayError) {
        eprintln!("  persistence error at {stage:?} (swallowed): {error}");
    }
}

#[derive(Serialize)]
struct ReadResult {
    element: String,
    value: String,
}

#[derive(Serialize)]
struct ReplayOutcome {
    session: String,
    enrollment: Enrollment,
    reads: Vec<ReadResult>,
    activity: Vec<ActivityLogEntry>,
}

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    session: PathBuf,
    config_path: Option<PathBuf>,
    enrollment: Option<Uuid>,
    quiz_best: Option<f64>,
    threshold: Option<u32>,
    format: String,
) -> Result<()> {
    let script = parse_script(&session)?;

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => ScormkitConfig::default(),
    };
    let passing_threshold = threshold.unwrap_or(config.passing_threshold);

    let (gateway, enrollment_id, memory): (
        Arc<dyn PersistenceGateway>,
        EnrollmentId,
        Option<Arc<MemoryGateway>>,
    ) = match &config.gateway {
        GatewayConfig::Memory => {
            let memory = Arc::new(MemoryGateway::new());
            let row = Enrollment {
                id: enrollment.unwrap_or_else(Uuid::new_v4),
                student_id: script.learner.id,
                course_id: None,
                status: EnrollmentStatus::NotStarted,
                quiz_score: quiz_best,
                scorm_score: None,
                best_score: 0,
                weights: None,
            };
            let id = row.id;
            memory.insert_enrollment(row);
            (
                Arc::clone(&memory) as Arc<dyn PersistenceGateway>,
                id,
                Some(memory),
            )
        }
        GatewayConfig::Rest { .. } => {
            let id = enrollment
                .context("--enrollment is required when replaying against a REST gateway")?;
            (create_gateway(&config), id, None)
        }
    };

    eprintln!(
        "Replaying '{}' ({} calls) against {} gateway",
        script.name,
        script.calls.len(),
        gateway.name()
    );

    let adapter = ScormAdapter::new(
        &script.learner,
        Some(EnrollmentBinding {
            enrollment_id,
            course_id: None,
        }),
        Arc::clone(&gateway),
        AggregatorConfig { passing_threshold },
    )
    .with_observer(Arc::new(ConsoleObserver));

    let mut reads = Vec::new();
    for call in &script.calls {
        match call {
            ApiCall::Initialize => {
                adapter.initialize("");
            }
            ApiCall::GetValue { element } => {
                reads.push(ReadResult {
                    element: element.clone(),
                    value: adapter.get_value(element),
                });
            }
            ApiCall::SetValue { element, value } => {
                adapter.set_value(element, value);
            }
            ApiCall::Commit => {
                adapter.commit("").await;
            }
            ApiCall::Finish => {
                adapter.finish("").await;
            }
        }
    }

    let final_enrollment = gateway
        .read_enrollment(enrollment_id)
        .await
        .context("failed to read back the enrollment after replay")?;
    let activity = memory.map(|m| m.logged_entries()).unwrap_or_default();

    match format.as_str() {
        "json" => {
            let outcome = ReplayOutcome {
                session: script.name,
                enrollment: final_enrollment,
                reads,
                activity,
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        _ => {
            print_tables(&final_enrollment, &reads, &activity);
        }
    }

    Ok(())
}

fn print_tables(enrollment: &Enrollment, reads: &[ReadResult], activity: &[ActivityLogEntry]) {
    use comfy_table::{Cell, Table};

    let weights = enrollment.weights();
    let mut summary = Table::new();
    summary.set_header(vec!["Status", "Quiz Best", "SCORM Best", "Weights", "Best Score"]);
    summary.add_row(vec![
        Cell::new(enrollment.status),
        Cell::new(
            enrollment
                .quiz_score
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
        ),
        Cell::new(
            enrollment
                .scorm_score
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
        ),
        Cell::new(format!(
            "{}/{}",
            weights.quiz_percentage, weights.scorm_percentage
        )),
        Cell::new(enrollment.best_score),
    ]);
    println!("{summary}");

    if !activity.is_empty() {
        let mut log = Table::new();
        log.set_header(vec!["#", "Interaction", "Score", "Recorded At"]);
        for (index, entry) in activity.iter().enumerate() {
            log.add_row(vec![
                Cell::new(index + 1),
                Cell::new(&entry.interaction_type),
                Cell::new(entry.score),
                Cell::new(entry.recorded_at.to_rfc3339()),
            ]);
        }
        println!("{log}");
    }

    for read in reads {
        println!("get_value({}) = {:?}", read.element, read.value);
    }
}
