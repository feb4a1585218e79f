//! scormkit-runtime — The SCORM runtime API adapter.
//!
//! Presents the fixed runtime surface a training package calls, backed by a
//! private runtime variable store, with committed state flowing to the
//! persistence gateway and on to the score aggregator.

pub mod adapter;
pub mod session;

pub use adapter::ScormAdapter;
pub use session::{EnrollmentBinding, SessionState};
