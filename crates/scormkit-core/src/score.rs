//! Pure score-aggregation functions.
//!
//! Best scores are monotonically non-decreasing per channel, and the
//! combined score is a weighted sum over already-maximized inputs. Both
//! operations commute, so the final best score is independent of how the
//! quiz and SCORM writers interleave.

use crate::model::{CompletionWeights, EnrollmentStatus};

/// Default passing threshold for the completion rule.
pub const DEFAULT_PASSING_THRESHOLD: u32 = 70;

/// Merge a newly reported score into a channel's best-ever score.
///
/// The report is clamped to 0..=100 first; a lower subsequent attempt never
/// erases a previous best.
pub fn merge_best(prior: Option<f64>, reported: f64) -> f64 {
    let reported = reported.clamp(0.0, 100.0);
    match prior {
        Some(prior) => prior.max(reported),
        None => reported,
    }
}

/// Weighted combination of the two channel bests, rounded and clamped to
/// 0..=100. A channel that has not reported yet counts as 0.
pub fn weighted_best_score(
    quiz: Option<f64>,
    scorm: Option<f64>,
    weights: CompletionWeights,
) -> u32 {
    let quiz = quiz.unwrap_or(0.0);
    let scorm = scorm.unwrap_or(0.0);
    let combined = quiz * f64::from(weights.quiz_percentage) / 100.0
        + scorm * f64::from(weights.scorm_percentage) / 100.0;
    combined.round().clamp(0.0, 100.0) as u32
}

/// Decide the next enrollment status for a recompute.
///
/// Completion requires crossing the threshold with a terminal signal in the
/// same recompute. The result is reached by stepping through the transition
/// relation: a recompute for a `not_started` enrollment counts as first
/// content access and moves it to `in_progress`, and only `in_progress` can
/// complete, so one recompute may compose the two steps. Terminal states
/// admit no step and never revert.
pub fn completion_decision(
    current: EnrollmentStatus,
    best_score: u32,
    threshold: u32,
    terminal_seen: bool,
) -> EnrollmentStatus {
    if current.is_terminal() {
        return current;
    }
    let mut status = current;
    if status.can_transition_to(EnrollmentStatus::InProgress) {
        status = EnrollmentStatus::InProgress;
    }
    if best_score >= threshold
        && terminal_seen
        && status.can_transition_to(EnrollmentStatus::Completed)
    {
        status = EnrollmentStatus::Completed;
    }
    status
}
