//! One-shot backend bootstrap.
//!
//! # Responsibility
//! - Build the store stack from [`BackendConfig`]: remote transport, then
//!   the persistent cache layered under it when enabled.
//! - Own the shared [`HealthState`] and hand it to the probe and repositories.
//!
//! # Invariants
//! - Bootstrap never fails: configuration or open errors put the backend in
//!   offline preview mode (no store handle) and are kept for diagnostics.
//! - Every repository built from one backend shares one store and one health
//!   state.

use crate::config::{BackendConfig, CacheLocation, ConfigError, TabManager};
use crate::db::DbError;
use crate::model::TenantId;
use crate::repo::phase_repo::{PhaseRepository, SubphaseRepository};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::reminder_repo::ReminderRepository;
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_log_repo::TaskLogRepository;
use crate::resilience::{ConnectivityProbe, HealthMonitor, HealthState, Resilient};
use crate::service::project_service::ProjectService;
use crate::service::reminder_service::ReminderService;
use crate::store::{DocumentStore, SqliteDocumentStore, SyncedStore};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Reason the backend started in offline preview mode.
#[derive(Debug)]
pub enum BackendError {
    Config(ConfigError),
    Db(DbError),
    /// No emulator path and no externally supplied remote store.
    NoRemoteTransport,
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NoRemoteTransport => write!(f, "no remote transport configured"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NoRemoteTransport => None,
        }
    }
}

impl From<ConfigError> for BackendError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

pub struct Backend {
    config: BackendConfig,
    tenant: TenantId,
    guard: Resilient,
    synced: Option<SyncedStore>,
    init_error: Option<BackendError>,
}

impl Backend {
    /// Connects using the transport named in `config`.
    ///
    /// The only built-in transport is the local emulator database at
    /// `remote.emulator_path`.
    pub fn connect(config: BackendConfig) -> Self {
        Self::bootstrap(config, None)
    }

    /// Connects over an externally supplied remote store.
    pub fn with_remote(config: BackendConfig, remote: Arc<dyn DocumentStore>) -> Self {
        Self::bootstrap(config, Some(remote))
    }

    /// Backend with no store handle; every repository returns its fallback.
    pub fn offline(config: BackendConfig) -> Self {
        let tenant = TenantId::new(config.tenant_id.clone());
        Self {
            config,
            tenant,
            guard: Resilient::offline(HealthState::new()),
            synced: None,
            init_error: None,
        }
    }

    fn bootstrap(config: BackendConfig, remote: Option<Arc<dyn DocumentStore>>) -> Self {
        let health = HealthState::new();
        let tenant = TenantId::new(config.tenant_id.clone());
        match build_store(&config, remote, &health) {
            Ok((store, synced)) => {
                info!(
                    "event=backend_init module=backend status=ok tenant={} cache={} tabs={}",
                    tenant,
                    synced.is_some(),
                    config.cache.tab_manager.as_str()
                );
                Self {
                    config,
                    tenant,
                    guard: Resilient::new(Some(store), health),
                    synced,
                    init_error: None,
                }
            }
            Err(err) => {
                error!(
                    "event=backend_init module=backend status=error mode=offline_preview error={}",
                    err
                );
                Self {
                    config,
                    tenant,
                    guard: Resilient::offline(health),
                    synced: None,
                    init_error: Some(err),
                }
            }
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn is_offline_preview(&self) -> bool {
        self.guard.is_offline_preview()
    }

    /// Why bootstrap fell back to offline preview, if it did.
    pub fn init_error(&self) -> Option<&BackendError> {
        self.init_error.as_ref()
    }

    pub fn health(&self) -> &HealthState {
        self.guard.health()
    }

    /// Cache-layered store, when the persistent cache is enabled.
    pub fn synced_store(&self) -> Option<&SyncedStore> {
        self.synced.as_ref()
    }

    pub fn probe(&self) -> ConnectivityProbe {
        self.guard.probe()
    }

    /// Starts the background health monitor. Requires a tokio runtime.
    pub fn spawn_monitor(&self) -> HealthMonitor {
        HealthMonitor::spawn(self.probe(), self.config.probe_interval())
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.guard.clone(), self.tenant.clone())
    }

    pub fn phases(&self) -> PhaseRepository {
        PhaseRepository::new(self.guard.clone(), self.tenant.clone())
    }

    pub fn subphases(&self) -> SubphaseRepository {
        SubphaseRepository::new(self.guard.clone(), self.tenant.clone())
    }

    pub fn task_logs(&self) -> TaskLogRepository {
        TaskLogRepository::new(self.guard.clone(), self.tenant.clone())
    }

    pub fn reminders(&self) -> ReminderRepository {
        ReminderRepository::new(self.guard.clone(), self.tenant.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(
            self.guard.clone(),
            self.tenant.clone(),
            self.config.missing_settings,
        )
    }

    pub fn project_service(&self) -> ProjectService {
        ProjectService::new(self.projects(), self.task_logs())
    }

    pub fn reminder_service(&self) -> ReminderService {
        ReminderService::new(self.reminders(), self.task_logs())
    }
}

type BuiltStore = (Arc<dyn DocumentStore>, Option<SyncedStore>);

fn build_store(
    config: &BackendConfig,
    remote: Option<Arc<dyn DocumentStore>>,
    health: &HealthState,
) -> Result<BuiltStore, BackendError> {
    config.validate()?;
    let remote: Arc<dyn DocumentStore> = match (remote, &config.remote.emulator_path) {
        (Some(remote), _) => remote,
        // The emulator file stands in for a shared server.
        (None, Some(path)) => Arc::new(SqliteDocumentStore::open(path, TabManager::Multiple)?),
        (None, None) => return Err(BackendError::NoRemoteTransport),
    };

    if !config.cache.enabled {
        return Ok((remote, None));
    }
    let cache = match &config.cache.location {
        CacheLocation::Memory => SqliteDocumentStore::open_in_memory()?,
        CacheLocation::File(path) => SqliteDocumentStore::open(path, config.cache.tab_manager)?,
    };
    let synced = SyncedStore::new(
        remote,
        cache,
        config.cache.revalidate_in_background,
        health.clone(),
    );
    let store: Arc<dyn DocumentStore> = Arc::new(synced.clone());
    Ok((store, Some(synced)))
}
