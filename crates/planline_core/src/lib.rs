//! Core data-access layer for Planline.
//!
//! Views talk to typed repositories; repositories run store primitives
//! through the resilient wrapper, which classifies failures, keeps the
//! shared health state current and hands back fallbacks instead of errors.

pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod resilience;
pub mod scope;
pub mod service;
pub mod store;

pub use backend::{Backend, BackendError};
pub use config::{BackendConfig, CacheLocation, CacheSettings, MissingSettings, TabManager};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::TenantId;
pub use notify::NotificationPayload;
pub use resilience::{
    classify, ConnectivityProbe, FailureKind, HealthMonitor, HealthState, HealthStatus, Resilient,
};
pub use scope::{ScopeTicket, ViewScope};
pub use service::{ServiceError, ServiceResult};
pub use store::{DocumentStore, StoreError, StoreErrorCode, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
