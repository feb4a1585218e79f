//! The SCORM API adapter.
//!
//! One instance per loaded training package and enrollment attempt. The
//! package drives the fixed API surface synchronously; `commit`/`finish`
//! suspend only at the gateway call boundary. Backend failures are logged
//! and reported to the session observer but never surfaced to the package,
//! so third-party content playback is never interrupted.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, instrument, warn};

use scormkit_core::aggregate::{Aggregator, AggregatorConfig, ScormReport};
use scormkit_core::model::{LearnerIdentity, NewActivityLog};
use scormkit_core::traits::{
    CheckpointRecord, CompletionEvent, NoopObserver, PersistStage, PersistenceGateway,
    SessionObserver,
};
use scormkit_core::vars::RuntimeVars;

use crate::session::{EnrollmentBinding, SessionState};

/// Success return value of the boolean-shaped API calls.
pub const API_TRUE: &str = "true";
/// Error code returned by `get_last_error`; the adapter never tracks
/// per-call errors, so this is always "0" (no error).
pub const NO_ERROR: &str = "0";

struct Inner {
    vars: RuntimeVars,
    state: SessionState,
}

/// The runtime API adapter a training package drives.
pub struct ScormAdapter {
    inner: Mutex<Inner>,
    binding: Option<EnrollmentBinding>,
    gateway: Arc<dyn PersistenceGateway>,
    aggregator: Aggregator,
    observer: Arc<dyn SessionObserver>,
}

impl ScormAdapter {
    /// Build an adapter for one session, seeding the variable store from
    /// the learner identity. With `binding` absent the session runs in
    /// preview mode and persists nothing.
    pub fn new(
        learner: &LearnerIdentity,
        binding: Option<EnrollmentBinding>,
        gateway: Arc<dyn PersistenceGateway>,
        config: AggregatorConfig,
    ) -> Self {
        let aggregator = Aggregator::new(Arc::clone(&gateway), config);
        Self {
            inner: Mutex::new(Inner {
                vars: RuntimeVars::seeded(learner),
                state: SessionState::Uninitialized,
            }),
            binding,
            gateway,
            aggregator,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Register a session observer. Replaces the default no-op observer.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Current session lifecycle state.
    pub fn session_state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Mark the session usable. Idempotent; repeated calls succeed.
    pub fn initialize(&self, _param: &str) -> &'static str {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == SessionState::Uninitialized {
            inner.state = SessionState::Initialized;
        }
        API_TRUE
    }

    /// Read a runtime variable; unknown elements read as the empty string.
    pub fn get_value(&self, element: &str) -> String {
        self.inner.lock().unwrap().vars.get(element)
    }

    /// Overwrite a runtime variable. Always succeeds; values are validated,
    /// if at all, downstream at persistence time.
    pub fn set_value(&self, element: &str, value: &str) -> &'static str {
        self.inner.lock().unwrap().vars.set(element, value);
        API_TRUE
    }

    /// Checkpoint the current runtime state without ending the session.
    #[instrument(skip(self))]
    pub async fn commit(&self, _param: &str) -> &'static str {
        self.checkpoint(false).await;
        API_TRUE
    }

    /// Terminal checkpoint; emits a completion event to the observer after
    /// the persist attempt, regardless of its outcome.
    #[instrument(skip(self))]
    pub async fn finish(&self, _param: &str) -> &'static str {
        let checkpoint = self.checkpoint(true).await;
        self.inner.lock().unwrap().state = SessionState::Terminated;
        self.observer.on_finish(&CompletionEvent {
            enrollment_id: checkpoint.enrollment_id,
            lesson_status: checkpoint.lesson_status,
            score: checkpoint.score,
        });
        API_TRUE
    }

    /// The adapter does not track per-call errors; always "0".
    pub fn get_last_error(&self) -> &'static str {
        NO_ERROR
    }

    /// Fixed no-op implementation.
    pub fn get_error_string(&self, _code: &str) -> &'static str {
        ""
    }

    /// Fixed no-op implementation.
    pub fn get_diagnostic(&self, _code: &str) -> &'static str {
        ""
    }

    /// Convert current runtime state into a durable activity log row and
    /// hand the reported score to the aggregator. Gateway failures are
    /// swallowed here; the caller always reports success to the package.
    async fn checkpoint(&self, terminal: bool) -> CheckpointRecord {
        // Snapshot under the lock, then release it before any await.
        let (raw_data, lesson_status, score) = {
            let inner = self.inner.lock().unwrap();
            (
                inner.vars.snapshot(),
                inner.vars.lesson_status(),
                inner.vars.parsed_score(),
            )
        };

        let checkpoint = CheckpointRecord {
            enrollment_id: self.binding.map(|b| b.enrollment_id),
            lesson_status: lesson_status.clone(),
            score,
            terminal,
            raw_data: raw_data.clone(),
        };
        self.observer.on_commit(&checkpoint);

        let Some(binding) = self.binding else {
            debug!("no enrollment bound, skipping persistence");
            return checkpoint;
        };

        let entry = NewActivityLog {
            enrollment_id: binding.enrollment_id,
            course_id: binding.course_id,
            interaction_type: lesson_status.clone(),
            score,
            raw_data,
            recorded_at: Utc::now(),
        };
        if let Err(error) = self.gateway.append_activity_log(&entry).await {
            warn!(
                gateway = self.gateway.name(),
                enrollment_id = %binding.enrollment_id,
                %error,
                "activity log append failed, not surfaced to package"
            );
            self.observer
                .on_persistence_error(PersistStage::ActivityLog, &error);
        }

        let report = ScormReport {
            score,
            lesson_status,
            terminal,
        };
        if let Err(error) = self
            .aggregator
            .ingest_scorm(binding.enrollment_id, &report)
            .await
        {
            warn!(
                gateway = self.gateway.name(),
                enrollment_id = %binding.enrollment_id,
                %error,
                "score aggregation failed, not surfaced to package"
            );
            self.observer
                .on_persistence_error(PersistStage::Aggregation, &error);
        }

        checkpoint
    }
}

impl std::fmt::Debug for ScormAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScormAdapter")
            .field("binding", &self.binding)
            .field("gateway", &self.gateway.name())
            .field("state", &self.session_state())
            .finish()
    }
}
