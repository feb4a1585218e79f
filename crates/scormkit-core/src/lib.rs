//! scormkit-core — Data model, scoring, and gateway traits.
//!
//! This crate defines the fundamental types, the enrollment state machine,
//! the pure score-aggregation logic, and the traits that the runtime adapter
//! and gateway crates build on.

pub mod aggregate;
pub mod error;
pub mod model;
pub mod score;
pub mod script;
pub mod traits;
pub mod vars;
