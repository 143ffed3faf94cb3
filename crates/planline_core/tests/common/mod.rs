#![allow(dead_code)]

use async_trait::async_trait;
use planline_core::config::RemoteConfig;
use planline_core::store::{
    Document, DocumentPath, DocumentStore, Query, SetOptions, SqliteDocumentStore, StoreError,
    StoreResult, WriteData,
};
use planline_core::{Backend, BackendConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory store that counts calls and fails on demand.
pub struct ScriptedStore {
    inner: SqliteDocumentStore,
    calls: AtomicUsize,
    failure: Mutex<Option<StoreError>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteDocumentStore::open_in_memory().unwrap(),
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        })
    }

    pub fn fail_with(&self, err: StoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn heal(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn engine(&self) -> &SqliteDocumentStore {
        &self.inner
    }

    fn enter(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn get_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.enter()?;
        self.inner.get_doc(path).await
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.enter()?;
        self.inner.run_query(query).await
    }

    async fn add_doc(&self, collection: &str, data: WriteData) -> StoreResult<DocumentPath> {
        self.enter()?;
        self.inner.add_doc(collection, data).await
    }

    async fn set_doc(
        &self,
        path: &DocumentPath,
        data: WriteData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.enter()?;
        self.inner.set_doc(path, data, options).await
    }

    async fn update_doc(&self, path: &DocumentPath, data: WriteData) -> StoreResult<()> {
        self.enter()?;
        self.inner.update_doc(path, data).await
    }

    async fn delete_doc(&self, path: &DocumentPath) -> StoreResult<()> {
        self.enter()?;
        self.inner.delete_doc(path).await
    }
}

/// Valid configuration talking to the remote directly (no cache).
pub fn direct_config() -> BackendConfig {
    let mut config = BackendConfig {
        remote: RemoteConfig {
            project_id: "planline-test".to_string(),
            api_key: "test-key".to_string(),
            emulator_path: None,
        },
        ..BackendConfig::default()
    };
    config.cache.enabled = false;
    config
}

/// Valid configuration with an in-memory cache and no background refresh.
pub fn cached_config() -> BackendConfig {
    let mut config = direct_config();
    config.cache.enabled = true;
    config.cache.revalidate_in_background = false;
    config
}

pub fn backend_over(store: &Arc<ScriptedStore>) -> Backend {
    Backend::with_remote(direct_config(), store.clone())
}
