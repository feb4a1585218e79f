//! Adapter session lifecycle types.

use uuid::Uuid;

use scormkit_core::model::EnrollmentId;

/// Lifecycle of one adapter instance.
///
/// Transitions are `Uninitialized → Initialized` on `Initialize` and
/// `→ Terminated` on `Finish`. Get/set/commit are accepted in any state;
/// real-world packages do not reliably call `Initialize` first, so the
/// adapter tracks state without enforcing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Terminated,
}

/// The enrollment context one adapter session persists into.
///
/// `None` on the adapter means a preview/anonymous session: checkpoints are
/// skipped entirely and every call still reports success.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentBinding {
    /// The enrollment receiving activity log rows and score updates.
    pub enrollment_id: EnrollmentId,
    /// The course, when known; copied onto each activity log row.
    pub course_id: Option<Uuid>,
}
