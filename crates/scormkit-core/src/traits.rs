//! Core trait definitions for the persistence gateway and session observers.
//!
//! The async gateway trait is implemented by the `scormkit-gateway` crate;
//! the observer trait is implemented by hosts embedding the runtime adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GatewayError;
use crate::model::{Enrollment, EnrollmentId, EnrollmentStatus, LogId, NewActivityLog};

// ---------------------------------------------------------------------------
// Persistence gateway trait
// ---------------------------------------------------------------------------

/// Trait for backends that store enrollments and activity log rows.
///
/// The core calls exactly three operations: append an immutable log row,
/// read an enrollment (weights travel with the record), and write back the
/// derived best score with an optional status transition. Nothing else on
/// the enrollment row is ever written through this trait.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Human-readable gateway name (e.g. "rest").
    fn name(&self) -> &str;

    /// Append an immutable activity log row.
    async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<LogId, GatewayError>;

    /// Read the current enrollment record.
    async fn read_enrollment(&self, id: EnrollmentId) -> Result<Enrollment, GatewayError>;

    /// Write the derived best score and, when present, a status transition.
    async fn update_best_score(
        &self,
        id: EnrollmentId,
        best_score: u32,
        new_status: Option<EnrollmentStatus>,
    ) -> Result<(), GatewayError>;
}

// ---------------------------------------------------------------------------
// Session observer trait
// ---------------------------------------------------------------------------

/// Which persistence step a swallowed failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistStage {
    /// Appending the activity log row.
    ActivityLog,
    /// Recomputing and writing the enrollment best score.
    Aggregation,
}

/// A checkpoint taken on `Commit` or `Finish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// The bound enrollment, when the session has one.
    pub enrollment_id: Option<EnrollmentId>,
    /// Lesson status string at checkpoint time, verbatim.
    pub lesson_status: String,
    /// Raw score parsed as a float (0 on parse failure).
    pub score: f64,
    /// Whether this checkpoint was taken by `Finish`.
    pub terminal: bool,
    /// Snapshot of the runtime variables.
    pub raw_data: HashMap<String, String>,
}

/// Emitted exactly once, when `Finish` is called on a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// The bound enrollment, when the session has one.
    pub enrollment_id: Option<EnrollmentId>,
    /// Lesson status string at finish time.
    pub lesson_status: String,
    /// Last reported raw score.
    pub score: f64,
}

/// Observer of adapter session lifecycle events.
///
/// Replaces ad-hoc mutable callback properties: handlers are registered at
/// adapter construction and receive typed events. `on_persistence_error` is
/// the structured channel for failures that are deliberately never surfaced
/// to the training package.
pub trait SessionObserver: Send + Sync {
    fn on_commit(&self, checkpoint: &CheckpointRecord);
    fn on_finish(&self, event: &CompletionEvent);
    fn on_persistence_error(&self, stage: PersistStage, error: &GatewayError);
}

/// No-op session observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_commit(&self, _: &CheckpointRecord) {}
    fn on_finish(&self, _: &CompletionEvent) {}
    fn on_persistence_error(&self, _: PersistStage, _: &GatewayError) {}
}
