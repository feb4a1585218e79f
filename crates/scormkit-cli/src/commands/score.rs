//! The `scormkit score` command.

use anyhow::Result;

use scormkit_core::model::{CompletionWeights, EnrollmentStatus};
use scormkit_core::score::{completion_decision, weighted_best_score};

pub fn execute(
    quiz: Option<f64>,
    scorm: Option<f64>,
    quiz_weight: u32,
    scorm_weight: u32,
    threshold: u32,
) -> Result<()> {
    let weights =
        CompletionWeights::new(quiz_weight, scorm_weight).map_err(anyhow::Error::msg)?;
    let best_score = weighted_best_score(quiz, scorm, weights);
    let decision = completion_decision(EnrollmentStatus::InProgress, best_score, threshold, true);

    println!(
        "quiz {} x {}% + scorm {} x {}%",
        quiz.map_or_else(|| "-".to_string(), |s| s.to_string()),
        weights.quiz_percentage,
        scorm.map_or_else(|| "-".to_string(), |s| s.to_string()),
        weights.scorm_percentage,
    );
    println!("best_score: {best_score}");
    if decision == EnrollmentStatus::Completed {
        println!("passes threshold {threshold}: completes on a terminal signal");
    } else {
        println!("below threshold {threshold}: stays in progress");
    }

    Ok(())
}
