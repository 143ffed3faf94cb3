mod common;

use common::direct_config;
use planline_core::config::{CacheLocation, RemoteConfig};
use planline_core::model::project::NewProject;
use planline_core::{Backend, BackendConfig, BackendError, TabManager};

#[tokio::test]
async fn placeholder_credentials_start_offline_preview() {
    let backend = Backend::connect(BackendConfig::default());

    assert!(backend.is_offline_preview());
    assert!(matches!(backend.init_error(), Some(BackendError::Config(_))));
    assert!(backend.projects().get_projects().await.is_empty());
    assert!(!backend.probe().check_health().await);
}

#[tokio::test]
async fn missing_transport_starts_offline_preview() {
    let backend = Backend::connect(direct_config());

    assert!(backend.is_offline_preview());
    assert!(matches!(
        backend.init_error(),
        Some(BackendError::NoRemoteTransport)
    ));
}

#[tokio::test]
async fn emulator_with_file_cache_persists_across_backends() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = direct_config();
    config.remote = RemoteConfig {
        emulator_path: Some(dir.path().join("emulator.db")),
        ..config.remote.clone()
    };
    config.cache.enabled = true;
    config.cache.revalidate_in_background = false;
    config.cache.tab_manager = TabManager::Multiple;
    config.cache.location = CacheLocation::File(dir.path().join("cache").join("planline.db"));

    let first = Backend::connect(config.clone());
    assert!(first.init_error().is_none());
    first
        .projects()
        .add_project(NewProject::named("Persisted"))
        .await
        .unwrap();

    let second = Backend::connect(config);
    assert!(!second.is_offline_preview());
    let listed = second.projects().get_projects().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Persisted");
    assert!(second.probe().check_health().await);
}

#[test]
fn config_file_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planline.json");
    std::fs::write(
        &path,
        r#"{
            "tenant_id": "team-7",
            "remote": { "project_id": "p", "api_key": "k" },
            "cache": { "location": { "kind": "file", "path": "/tmp/planline-cache.db" }, "tab_manager": "single" },
            "probe_interval_secs": 10,
            "missing_settings": "report_absent"
        }"#,
    )
    .unwrap();

    let config = BackendConfig::from_path(&path).unwrap();
    assert_eq!(config.tenant_id, "team-7");
    assert_eq!(config.cache.tab_manager, TabManager::Single);
    assert_eq!(config.probe_interval().as_secs(), 10);
    assert!(config.validate().is_ok());
}
