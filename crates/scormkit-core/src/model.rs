//! Core data model types for scormkit.
//!
//! These are the fundamental types that the entire scormkit system uses
//! to represent enrollments, activity log rows, and learner identity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interaction tag used for activity log rows produced by the quiz
/// subsystem. Rows with any other tag are SCORM-originated.
pub const FINAL_QUIZ_INTERACTION: &str = "final_quiz";

/// Identifier of an enrollment record.
pub type EnrollmentId = Uuid;

/// Identifier of an appended activity log row.
pub type LogId = Uuid;

/// Completion state of one (student, course) enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl EnrollmentStatus {
    /// Whether the state machine allows moving from `self` to `target`.
    ///
    /// `completed` is terminal; `failed` is reachable from any state but
    /// only through administrative action, never through the aggregator.
    pub fn can_transition_to(self, target: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        match (self, target) {
            (NotStarted, InProgress) => true,
            (InProgress, Completed) => true,
            // Administrative marking, never performed by the aggregator.
            (NotStarted | InProgress | Completed, Failed) => true,
            _ => false,
        }
    }

    /// Whether `target` is reachable from `self` through a chain of legal
    /// transitions. A single recompute may compose several steps (a fresh
    /// enrollment that passes on its first terminal report moves through
    /// `in_progress` to `completed`), so write sites validate against the
    /// closure rather than the single-step relation.
    pub fn can_reach(self, target: EnrollmentStatus) -> bool {
        // `in_progress` is the only possible intermediate state, so one
        // hop through it covers every multi-step chain.
        self.can_transition_to(target)
            || (self.can_transition_to(EnrollmentStatus::InProgress)
                && EnrollmentStatus::InProgress.can_transition_to(target))
    }

    /// Terminal states admit no further transitions through the core.
    pub fn is_terminal(self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Failed)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::NotStarted => write!(f, "not_started"),
            EnrollmentStatus::InProgress => write!(f, "in_progress"),
            EnrollmentStatus::Completed => write!(f, "completed"),
            EnrollmentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(EnrollmentStatus::NotStarted),
            "in_progress" => Ok(EnrollmentStatus::InProgress),
            "completed" => Ok(EnrollmentStatus::Completed),
            "failed" => Ok(EnrollmentStatus::Failed),
            other => Err(format!("unknown enrollment status: {other}")),
        }
    }
}

/// Weighting of the two score channels, in integer percent summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionWeights {
    /// Share of the quiz channel in the combined score.
    pub quiz_percentage: u32,
    /// Share of the SCORM package channel in the combined score.
    pub scorm_percentage: u32,
}

impl CompletionWeights {
    /// Build a weight pair, rejecting pairs that do not sum to 100.
    pub fn new(quiz_percentage: u32, scorm_percentage: u32) -> Result<Self, String> {
        if quiz_percentage.checked_add(scorm_percentage) != Some(100) {
            return Err(format!(
                "completion weights must sum to 100, got {quiz_percentage}+{scorm_percentage}"
            ));
        }
        Ok(Self {
            quiz_percentage,
            scorm_percentage,
        })
    }
}

impl Default for CompletionWeights {
    fn default() -> Self {
        Self {
            quiz_percentage: 70,
            scorm_percentage: 30,
        }
    }
}

/// One (student, course) enrollment record as read from the gateway.
///
/// The core writes back only `best_score` and status transitions; the raw
/// per-channel scores are owned by their producers (quiz subsystem and the
/// SCORM adapter's activity log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier.
    pub id: EnrollmentId,
    /// The enrolled student.
    pub student_id: Uuid,
    /// The course, if the record carries one.
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Current completion state.
    pub status: EnrollmentStatus,
    /// Best quiz score ever recorded (0–100), absent before any submission.
    #[serde(default)]
    pub quiz_score: Option<f64>,
    /// Best SCORM-reported score ever recorded (0–100), absent before any
    /// package activity.
    #[serde(default)]
    pub scorm_score: Option<f64>,
    /// Derived combined score, 0–100.
    #[serde(default)]
    pub best_score: u32,
    /// Channel weights; `None` means the record predates per-enrollment
    /// weights and the 70/30 default applies.
    #[serde(default)]
    pub weights: Option<CompletionWeights>,
}

impl Enrollment {
    /// Effective channel weights, applying the 70/30 default when unset.
    pub fn weights(&self) -> CompletionWeights {
        self.weights.unwrap_or_default()
    }
}

/// An immutable activity log row, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Unique identifier assigned by the gateway.
    pub id: LogId,
    /// The enrollment this row belongs to.
    pub enrollment_id: EnrollmentId,
    /// The course, when known.
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Free-form tag: the verbatim lesson-status string for adapter
    /// checkpoints, "final_quiz" for quiz rows.
    pub interaction_type: String,
    /// The score reported with this row.
    pub score: f64,
    /// Snapshot of the runtime variables at checkpoint time.
    #[serde(default)]
    pub raw_data: HashMap<String, String>,
    /// When the row was appended.
    pub recorded_at: DateTime<Utc>,
}

/// A new activity log row, before the gateway assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivityLog {
    /// The enrollment this row belongs to.
    pub enrollment_id: EnrollmentId,
    /// The course, when known.
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Free-form tag, see [`ActivityLogEntry::interaction_type`].
    pub interaction_type: String,
    /// The score reported with this row.
    pub score: f64,
    /// Snapshot of the runtime variables at checkpoint time.
    #[serde(default)]
    pub raw_data: HashMap<String, String>,
    /// When the checkpoint was taken.
    pub recorded_at: DateTime<Utc>,
}

/// Identity of the learner driving one adapter session.
///
/// Used to pre-seed the runtime variable store so packages that read
/// `cmi.core.student_id`/`student_name` see sensible values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerIdentity {
    /// The student record id.
    pub id: Uuid,
    /// Institutional student number, preferred as the learner id.
    #[serde(default)]
    pub student_number: Option<String>,
    /// Email, second choice for the learner id.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl LearnerIdentity {
    /// Resolve the learner id through the identity fallback chain:
    /// student number, then email, then the record uuid.
    pub fn learner_id(&self) -> String {
        self.student_number
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Display name as "first last", dropping absent parts.
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(first) = &self.first_name {
            parts.push(first.as_str());
        }
        if let Some(last) = &self.last_name {
            parts.push(last.as_str());
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_and_parse() {
        assert_eq!(EnrollmentStatus::NotStarted.to_string(), "not_started");
        assert_eq!(EnrollmentStatus::Completed.to_string(), "completed");
        assert_eq!(
            "in_progress".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::InProgress
        );
        assert!("done".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn transitions_are_one_way() {
        use EnrollmentStatus::*;
        assert!(NotStarted.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(Completed.can_transition_to(Failed));
        assert!(!InProgress.can_transition_to(NotStarted));
        assert!(InProgress.can_transition_to(Failed));
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!InProgress.is_terminal());
    }

    #[test]
    fn reachability_is_the_closure_of_single_steps() {
        use EnrollmentStatus::*;
        // Completed is reachable from not_started only through in_progress.
        assert!(!NotStarted.can_transition_to(Completed));
        assert!(NotStarted.can_reach(Completed));
        assert!(InProgress.can_reach(Completed));
        assert!(!Completed.can_reach(InProgress));
        assert!(!Completed.can_reach(NotStarted));
        assert!(!Failed.can_reach(InProgress));
        assert!(Completed.can_reach(Failed));
    }

    #[test]
    fn weights_must_sum_to_100() {
        assert!(CompletionWeights::new(70, 30).is_ok());
        assert!(CompletionWeights::new(50, 50).is_ok());
        assert!(CompletionWeights::new(60, 30).is_err());
        // An overflowing pair is rejected, not a panic.
        assert!(CompletionWeights::new(u32::MAX, 1).is_err());
        assert!(CompletionWeights::new(u32::MAX, 101).is_err());
        let defaults = CompletionWeights::default();
        assert_eq!(defaults.quiz_percentage, 70);
        assert_eq!(defaults.scorm_percentage, 30);
    }

    #[test]
    fn enrollment_weights_default_when_unset() {
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
        assert_eq!(enrollment.weights(), CompletionWeights::default());
    }

    #[test]
    fn learner_id_fallback_chain() {
        let mut learner = LearnerIdentity {
            id: Uuid::new_v4(),
            student_number: Some("S-1042".into()),
            email: Some("ada@example.edu".into()),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
        };
        assert_eq!(learner.learner_id(), "S-1042");
        learner.student_number = None;
        assert_eq!(learner.learner_id(), "ada@example.edu");
        learner.email = None;
        assert_eq!(learner.learner_id(), learner.id.to_string());
        assert_eq!(learner.display_name(), "Ada Lovelace");
    }

    #[test]
    fn enrollment_serde_roundtrip() {
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Some(Uuid::new_v4()),
            status: EnrollmentStatus::InProgress,
            quiz_score: Some(90.0),
            scorm_score: None,
            best_score: 63,
            weights: Some(CompletionWeights::default()),
        };
        let json = serde_json::to_string(&enrollment).unwrap();
        let back: Enrollment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, enrollment.id);
        assert_eq!(back.status, EnrollmentStatus::InProgress);
        assert_eq!(back.quiz_score, Some(90.0));
    }
}
