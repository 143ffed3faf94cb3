mod common;

use async_trait::async_trait;
use common::cached_config;
use planline_core::model::project::NewProject;
use planline_core::model::settings::{SettingsPatch, Theme};
use planline_core::store::{
    AccessPolicy, Direction, Document, DocumentPath, DocumentStore, Query, SetOptions,
    SqliteDocumentStore, StoreResult, WriteData,
};
use planline_core::{Backend, BackendConfig, HealthStatus};
use std::sync::Arc;
use std::time::Duration;

/// Remote whose queries answer late, widening the refresh window.
struct SlowQueries {
    inner: SqliteDocumentStore,
    delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowQueries {
    async fn get_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.inner.get_doc(path).await
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let docs = self.inner.run_query(query).await;
        tokio::time::sleep(self.delay).await;
        docs
    }

    async fn add_doc(&self, collection: &str, data: WriteData) -> StoreResult<DocumentPath> {
        self.inner.add_doc(collection, data).await
    }

    async fn set_doc(
        &self,
        path: &DocumentPath,
        data: WriteData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.inner.set_doc(path, data, options).await
    }

    async fn update_doc(&self, path: &DocumentPath, data: WriteData) -> StoreResult<()> {
        self.inner.update_doc(path, data).await
    }

    async fn delete_doc(&self, path: &DocumentPath) -> StoreResult<()> {
        self.inner.delete_doc(path).await
    }
}

fn refreshing_config() -> BackendConfig {
    let mut config = cached_config();
    config.cache.revalidate_in_background = true;
    config
}

fn listed(projects: &[planline_core::model::project::Project]) -> Vec<(String, i64)> {
    projects
        .iter()
        .map(|project| (project.name.clone(), project.order_index))
        .collect()
}

fn tenant_projects() -> Query {
    Query::collection("projects")
        .where_eq("ownerId", "demo")
        .order_by("orderIndex", Direction::Ascending)
}

fn setup() -> (SqliteDocumentStore, Backend) {
    let remote = SqliteDocumentStore::open_in_memory().unwrap();
    let backend = Backend::with_remote(cached_config(), Arc::new(remote.clone()));
    assert!(backend.synced_store().is_some());
    (remote, backend)
}

#[tokio::test]
async fn offline_writes_commit_locally_and_flush_in_order() {
    let (remote, backend) = setup();
    let synced = backend.synced_store().unwrap();
    remote.set_reachable(false);

    let first = backend
        .projects()
        .add_project(NewProject::named("Offline A"))
        .await
        .expect("locally committed");
    backend
        .projects()
        .add_project(NewProject::named("Offline B"))
        .await
        .expect("locally committed");

    assert_eq!(synced.cache().pending_count().await.unwrap(), 2);
    let local = backend.projects().get_projects().await;
    let names: Vec<_> = local.iter().map(|project| project.name.as_str()).collect();
    assert_eq!(names, ["Offline A", "Offline B"]);

    remote.set_reachable(true);
    assert_eq!(synced.flush_pending_writes().await.unwrap(), 2);
    assert_eq!(synced.cache().pending_count().await.unwrap(), 0);

    let remote_docs = remote.run_query(&tenant_projects()).await.unwrap();
    assert_eq!(remote_docs.len(), 2);
    assert_eq!(remote_docs[0].id, first);
}

#[tokio::test]
async fn cached_results_are_served_while_the_remote_is_unreachable() {
    let (remote, backend) = setup();
    backend
        .projects()
        .add_project(NewProject::named("Known"))
        .await
        .unwrap();
    assert_eq!(remote.run_query(&tenant_projects()).await.unwrap().len(), 1);

    remote.set_reachable(false);
    let listed = backend.projects().get_projects().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Known");
}

#[tokio::test]
async fn cache_miss_reads_through_and_populates_the_cache() {
    let (remote, backend) = setup();
    remote
        .set_doc(
            &DocumentPath::new("projects", "server-side"),
            WriteData::new()
                .set("ownerId", "demo")
                .set("name", "From server")
                .set("status", "active")
                .set("orderIndex", 0),
            SetOptions::overwrite(),
        )
        .await
        .unwrap();

    let listed = backend.projects().get_projects().await;
    assert_eq!(listed.len(), 1);

    let cache = backend.synced_store().unwrap().cache();
    assert_eq!(cache.run_query(&tenant_projects()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn revalidation_drops_documents_deleted_remotely() {
    let (remote, backend) = setup();
    let projects = backend.projects();
    let keep = projects.add_project(NewProject::named("keep")).await.unwrap();
    let gone = projects.add_project(NewProject::named("gone")).await.unwrap();

    remote
        .delete_doc(&DocumentPath::new("projects", &gone))
        .await
        .unwrap();
    let synced = backend.synced_store().unwrap();
    synced.revalidate_query(&tenant_projects()).await.unwrap();

    let cached = synced.cache().run_query(&tenant_projects()).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, keep);
}

#[tokio::test]
async fn queued_write_rejected_by_the_remote_is_dropped() {
    let (remote, backend) = setup();
    let synced = backend.synced_store().unwrap();
    remote.set_reachable(false);
    backend
        .projects()
        .add_project(NewProject::named("Not allowed"))
        .await
        .unwrap();

    remote.set_reachable(true);
    remote.set_access_policy(AccessPolicy::DenyAll);
    assert_eq!(synced.flush_pending_writes().await.unwrap(), 0);
    assert_eq!(synced.cache().pending_count().await.unwrap(), 0);
    assert!(synced
        .cache()
        .run_query(&tenant_projects())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn probe_reads_the_server_not_the_cache() {
    let (remote, backend) = setup();
    remote.set_access_policy(AccessPolicy::DenyAll);

    assert!(!backend.probe().check_health().await);
    assert!(backend.health().is_blocked());

    remote.set_access_policy(AccessPolicy::AllowAll);
    assert!(backend.probe().check_health().await);
    assert!(!backend.health().is_blocked());
}

#[tokio::test]
async fn limited_refresh_keeps_documents_beyond_the_limit() {
    let (remote, backend) = setup();
    let projects = backend.projects();
    projects.add_project(NewProject::named("first")).await.unwrap();
    let second = projects.add_project(NewProject::named("second")).await.unwrap();
    remote
        .delete_doc(&DocumentPath::new("projects", &second))
        .await
        .unwrap();

    let synced = backend.synced_store().unwrap();
    let first_page = synced
        .revalidate_query(&tenant_projects().limit(1))
        .await
        .unwrap();
    assert_eq!(first_page.len(), 1);
    assert_eq!(
        synced.cache().run_query(&tenant_projects()).await.unwrap().len(),
        2
    );

    synced.revalidate_query(&tenant_projects()).await.unwrap();
    assert_eq!(
        synced.cache().run_query(&tenant_projects()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn write_during_background_refresh_stays_visible() {
    let remote = SqliteDocumentStore::open_in_memory().unwrap();
    let slow = SlowQueries {
        inner: remote.clone(),
        delay: Duration::from_millis(100),
    };
    let backend = Backend::with_remote(refreshing_config(), Arc::new(slow));
    let projects = backend.projects();

    projects.add_project(NewProject::named("A")).await.unwrap();
    assert_eq!(projects.get_projects().await.len(), 1);
    projects.add_project(NewProject::named("B")).await.unwrap();
    assert_eq!(
        listed(&projects.get_projects().await),
        [("A".to_string(), 0), ("B".to_string(), 1)]
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(projects.get_projects().await.len(), 2);
    projects.add_project(NewProject::named("C")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let expected = [
        ("A".to_string(), 0),
        ("B".to_string(), 1),
        ("C".to_string(), 2),
    ];
    assert_eq!(listed(&projects.get_projects().await), expected);
    let remote_docs = remote.run_query(&tenant_projects()).await.unwrap();
    assert_eq!(remote_docs.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_flushes_replay_each_write_once_in_order() {
    let remote = SqliteDocumentStore::open_in_memory().unwrap();
    let backend = Backend::with_remote(refreshing_config(), Arc::new(remote.clone()));
    let synced = backend.synced_store().unwrap().clone();
    let settings = backend.settings();

    remote.set_reachable(false);
    for theme in [Theme::Light, Theme::Dark] {
        settings
            .update_settings(SettingsPatch {
                theme: Some(theme),
                ..SettingsPatch::default()
            })
            .await
            .expect("locally committed");
    }
    assert_eq!(synced.cache().pending_count().await.unwrap(), 2);
    remote.set_reachable(true);

    let flushes: Vec<_> = (0..4)
        .map(|_| {
            let synced = synced.clone();
            tokio::spawn(async move { synced.flush_pending_writes().await })
        })
        .collect();
    let mut replayed = 0;
    for flush in flushes {
        replayed += flush.await.unwrap().unwrap();
    }

    assert_eq!(replayed, 2);
    assert_eq!(synced.cache().pending_count().await.unwrap(), 0);
    let stored = remote
        .get_doc(&DocumentPath::new("userSettings", "demo"))
        .await
        .unwrap()
        .expect("settings flushed");
    assert_eq!(stored.fields.get("theme"), Some(&serde_json::json!("dark")));
    assert_eq!(settings.get_settings().await.unwrap().theme, Theme::Dark);
}

#[tokio::test]
async fn refused_background_refresh_marks_the_backend_blocked() {
    let remote = SqliteDocumentStore::open_in_memory().unwrap();
    let backend = Backend::with_remote(refreshing_config(), Arc::new(remote.clone()));
    backend
        .projects()
        .add_project(NewProject::named("Cached"))
        .await
        .unwrap();
    let mut status = backend.health().subscribe();

    remote.set_access_policy(AccessPolicy::DenyAll);
    assert_eq!(backend.projects().get_projects().await.len(), 1);

    tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|status| *status == HealthStatus::Blocked),
    )
    .await
    .expect("refresh reports the refusal")
    .unwrap();
    assert!(backend.health().is_blocked());
}
