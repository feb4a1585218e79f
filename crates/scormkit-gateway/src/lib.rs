//! scormkit-gateway — Persistence gateway implementations.
//!
//! Implements the `PersistenceGateway` trait against a REST record store
//! and against an in-memory store for tests and offline replay.

pub mod config;
pub mod memory;
pub mod rest;

pub use config::{create_gateway, load_config, GatewayConfig, ScormkitConfig};
pub use memory::MemoryGateway;
pub use rest::RestGateway;
