//! Backend health state, connectivity probe and probe scheduling.
//!
//! # Responsibility
//! - Own the shared health state (`unknown` → `healthy` / `blocked`).
//! - Probe the store with one side-effect-free server read.
//! - Re-probe on a fixed interval only while the backend is blocked.
//!
//! # Invariants
//! - Only a successful probe clears the blocked state.
//! - Degraded and unknown probe failures leave the state untouched.
//! - Concurrent probes are allowed; the last completed one wins.

use super::classify::{classify, FailureKind};
use crate::store::{DocumentPath, DocumentStore};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Collection holding the well-known probe document.
pub const HEALTH_COLLECTION: &str = "_health";
/// Id of the well-known probe document.
pub const HEALTH_DOC_ID: &str = "ping";

/// Last known access state of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has completed yet.
    Unknown,
    Healthy,
    /// The backend refuses access; the UI shows a persistent banner.
    Blocked,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Blocked => "blocked",
        }
    }
}

/// Shared, observable health state. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct HealthState {
    sender: Arc<watch::Sender<HealthStatus>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(HealthStatus::Unknown);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn status(&self) -> HealthStatus {
        *self.sender.borrow()
    }

    pub fn is_blocked(&self) -> bool {
        self.status() == HealthStatus::Blocked
    }

    /// Subscribes to state changes (banner show/hide).
    pub fn subscribe(&self) -> watch::Receiver<HealthStatus> {
        self.sender.subscribe()
    }

    pub fn mark_blocked(&self) {
        self.transition(HealthStatus::Blocked);
    }

    pub fn mark_healthy(&self) {
        self.transition(HealthStatus::Healthy);
    }

    /// Applies the side effect of a classified failure.
    pub fn record_failure(&self, kind: &FailureKind) {
        if matches!(kind, FailureKind::Blocked) {
            self.mark_blocked();
        }
    }

    fn transition(&self, next: HealthStatus) {
        let previous = self.sender.send_replace(next);
        if previous != next {
            info!(
                "event=health_changed module=resilience status={} previous={}",
                next.as_str(),
                previous.as_str()
            );
        }
    }
}

/// Minimal reachability/permission probe.
#[derive(Clone)]
pub struct ConnectivityProbe {
    store: Option<Arc<dyn DocumentStore>>,
    health: HealthState,
    target: DocumentPath,
}

impl ConnectivityProbe {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, health: HealthState) -> Self {
        Self {
            store,
            health,
            target: DocumentPath::new(HEALTH_COLLECTION, HEALTH_DOC_ID),
        }
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    /// Returns `false` only when the store is absent or refuses access.
    ///
    /// Degraded and unknown failures return `true`: access is assumed to be
    /// fine once connectivity returns.
    pub async fn check_health(&self) -> bool {
        let Some(store) = &self.store else {
            debug!("event=health_probe module=resilience status=skipped reason=store_absent");
            return false;
        };

        match store.get_doc_from_server(&self.target).await {
            Ok(_) => {
                self.health.mark_healthy();
                true
            }
            Err(err) => {
                let kind = classify(&err);
                match &kind {
                    FailureKind::Blocked => warn!(
                        "event=health_probe module=resilience status=blocked error={}",
                        err
                    ),
                    FailureKind::Degraded => debug!(
                        "event=health_probe module=resilience status=degraded error={}",
                        err
                    ),
                    FailureKind::Unknown(_) => error!(
                        "event=health_probe module=resilience status=error error_code={} error={}",
                        err.code_str(),
                        err
                    ),
                }
                self.health.record_failure(&kind);
                kind != FailureKind::Blocked
            }
        }
    }
}

/// Background task that keeps the health state fresh.
///
/// Probes once on start. Afterwards it sleeps while the state is not
/// blocked and re-probes every `interval` while it is.
pub struct HealthMonitor {
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(probe: ConnectivityProbe, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut changes = probe.health().subscribe();
            probe.check_health().await;
            loop {
                if probe.health().is_blocked() {
                    tokio::time::sleep(interval).await;
                    probe.check_health().await;
                    continue;
                }
                let _ = changes.borrow_and_update();
                if probe.health().is_blocked() {
                    continue;
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_starts_unknown_and_tracks_transitions() {
        let health = HealthState::new();
        assert_eq!(health.status(), HealthStatus::Unknown);

        health.record_failure(&FailureKind::Degraded);
        assert_eq!(health.status(), HealthStatus::Unknown);

        health.record_failure(&FailureKind::Blocked);
        assert!(health.is_blocked());

        health.mark_healthy();
        assert_eq!(health.status(), HealthStatus::Healthy);
    }

    #[test]
    fn clones_share_one_state() {
        let health = HealthState::new();
        let view = health.clone();
        health.mark_blocked();
        assert!(view.is_blocked());
    }

    #[tokio::test]
    async fn probe_without_store_returns_false_and_keeps_state() {
        let probe = ConnectivityProbe::new(None, HealthState::new());
        assert!(!probe.check_health().await);
        assert_eq!(probe.health().status(), HealthStatus::Unknown);
    }
}
