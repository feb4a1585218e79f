//! In-memory gateway for tests and offline replay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use scormkit_core::error::GatewayError;
use scormkit_core::model::{
    ActivityLogEntry, Enrollment, EnrollmentId, EnrollmentStatus, LogId, NewActivityLog,
    FINAL_QUIZ_INTERACTION,
};
use scormkit_core::traits::PersistenceGateway;

/// A gateway keeping everything in process memory.
///
/// Beyond the trait, it exposes the seams tests need: seeding enrollments,
/// inspecting appended rows, call counters, and a write-failure toggle for
/// exercising the adapter's swallow-and-continue behavior.
///
/// On append it materializes the enrollment's `scorm_score` as the maximum
/// score across SCORM-originated rows, the same derivation the hosted
/// record store performs server-side.
#[derive(Default)]
pub struct MemoryGateway {
    enrollments: Mutex<HashMap<EnrollmentId, Enrollment>>,
    log: Mutex<Vec<ActivityLogEntry>>,
    append_calls: AtomicU32,
    update_calls: AtomicU32,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an enrollment row.
    pub fn insert_enrollment(&self, enrollment: Enrollment) {
        self.enrollments
            .lock()
            .unwrap()
            .insert(enrollment.id, enrollment);
    }

    /// Current state of an enrollment row, if present.
    pub fn enrollment(&self, id: EnrollmentId) -> Option<Enrollment> {
        self.enrollments.lock().unwrap().get(&id).cloned()
    }

    /// All appended activity log rows, in append order.
    pub fn logged_entries(&self) -> Vec<ActivityLogEntry> {
        self.log.lock().unwrap().clone()
    }

    /// Number of append calls made (failed ones included).
    pub fn append_count(&self) -> u32 {
        self.append_calls.load(Ordering::Relaxed)
    }

    /// Number of best-score update calls made (failed ones included).
    pub fn update_count(&self) -> u32 {
        self.update_calls.load(Ordering::Relaxed)
    }

    /// Make every mutating call fail with a network error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn write_failure(&self) -> Option<GatewayError> {
        self.fail_writes
            .load(Ordering::Relaxed)
            .then(|| GatewayError::NetworkError("injected write failure".to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<LogId, GatewayError> {
        self.append_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.write_failure() {
            return Err(err);
        }

        let id = Uuid::new_v4();
        self.log.lock().unwrap().push(ActivityLogEntry {
            id,
            enrollment_id: entry.enrollment_id,
            course_id: entry.course_id,
            interaction_type: entry.interaction_type.clone(),
            score: entry.score,
            raw_data: entry.raw_data.clone(),
            recorded_at: entry.recorded_at,
        });

        // Materialize the per-channel best on the enrollment row.
        if entry.interaction_type != FINAL_QUIZ_INTERACTION {
            let mut enrollments = self.enrollments.lock().unwrap();
            if let Some(enrollment) = enrollments.get_mut(&entry.enrollment_id) {
                let best = enrollment.scorm_score.unwrap_or(0.0).max(entry.score);
                enrollment.scorm_score = Some(best);
            }
        }

        Ok(id)
    }

    async fn read_enrollment(&self, id: EnrollmentId) -> Result<Enrollment, GatewayError> {
        self.enrollments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("enrollment {id}")))
    }

    async fn update_best_score(
        &self,
        id: EnrollmentId,
        best_score: u32,
        new_status: Option<EnrollmentStatus>,
    ) -> Result<(), GatewayError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.write_failure() {
            return Err(err);
        }

        let mut enrollments = self.enrollments.lock().unwrap();
        let enrollment = enrollments
            .get_mut(&id)
            .ok_or_else(|| GatewayError::NotFound(format!("enrollment {id}")))?;
        if let Some(status) = new_status {
            // One update may carry a composed transition chain, so validate
            // against reachability rather than single steps.
            if status != enrollment.status && !enrollment.status.can_reach(status) {
                return Err(GatewayError::InvalidRecord(format!(
                    "illegal status transition {} -> {}",
                    enrollment.status, status
                )));
            }
            enrollment.status = status;
        }
        enrollment.best_score = best_score;
        Ok(())
    }
}
