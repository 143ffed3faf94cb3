//! Failure classification, health tracking and the resilient wrapper.
//!
//! # Responsibility
//! - Turn raw store failures into a closed taxonomy.
//! - Track whether the backend refuses access and probe it back to health.
//! - Guarantee that repository callers receive values, never errors.

pub mod classify;
pub mod guard;
pub mod health;

pub use classify::{classify, FailureKind};
pub use guard::Resilient;
pub use health::{ConnectivityProbe, HealthMonitor, HealthState, HealthStatus};
