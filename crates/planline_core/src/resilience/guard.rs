//! Apply-and-recover envelope around store primitives.
//!
//! # Responsibility
//! - Run one store operation, classify its failure and apply the health
//!   side effect.
//! - Convert `Result` into value-or-fallback at the repository boundary.
//!
//! # Invariants
//! - No store failure escapes [`Resilient::or_fallback`].
//! - With no store handle, operations return their fallback without calling
//!   anything (offline preview mode).

use super::classify::{classify, FailureKind};
use super::health::{ConnectivityProbe, HealthState};
use crate::store::{DocumentStore, StoreResult};
use log::{debug, error, warn};
use std::future::Future;
use std::sync::Arc;

/// Shared store handle plus the health state it reports into.
#[derive(Clone)]
pub struct Resilient {
    store: Option<Arc<dyn DocumentStore>>,
    health: HealthState,
}

impl Resilient {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, health: HealthState) -> Self {
        Self { store, health }
    }

    /// Handle for offline preview mode.
    pub fn offline(health: HealthState) -> Self {
        Self::new(None, health)
    }

    pub fn is_offline_preview(&self) -> bool {
        self.store.is_none()
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    /// Probe over the same store handle and health state.
    pub fn probe(&self) -> ConnectivityProbe {
        ConnectivityProbe::new(self.store.clone(), self.health.clone())
    }

    /// Runs `op` and keeps the failure kind.
    ///
    /// An absent store reports [`FailureKind::Degraded`] without calling `op`.
    pub async fn attempt<T, F, Fut>(&self, name: &'static str, op: F) -> Result<T, FailureKind>
    where
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let Some(store) = &self.store else {
            debug!(
                "event=store_op module=resilience op={} status=skipped reason=store_absent",
                name
            );
            return Err(FailureKind::Degraded);
        };

        match op(Arc::clone(store)).await {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = classify(&err);
                match &kind {
                    FailureKind::Blocked => warn!(
                        "event=store_op module=resilience op={} status=blocked error={}",
                        name, err
                    ),
                    FailureKind::Degraded => debug!(
                        "event=store_op module=resilience op={} status=degraded error={}",
                        name, err
                    ),
                    FailureKind::Unknown(_) => error!(
                        "event=store_op module=resilience op={} status=error error_code={} error={}",
                        name,
                        err.code_str(),
                        err
                    ),
                }
                self.health.record_failure(&kind);
                Err(kind)
            }
        }
    }

    /// Runs `op`, returning `fallback` on any failure.
    pub async fn or_fallback<T, F, Fut>(&self, name: &'static str, fallback: T, op: F) -> T
    where
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.attempt(name, op).await.unwrap_or(fallback)
    }

    /// Runs a mutation; `None` means no effect occurred.
    pub async fn or_none<T, F, Fut>(&self, name: &'static str, op: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.attempt(name, op).await.ok()
    }
}
