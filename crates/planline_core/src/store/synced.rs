//! Remote store layered over the durable local cache.
//!
//! # Responsibility
//! - Serve reads cache-first and revalidate them against the remote
//!   (stale-while-revalidate).
//! - Commit writes locally when the remote is unreachable and queue them
//!   durably; flush the queue in order once the remote answers again.
//!
//! # Invariants
//! - Queued writes are replayed strictly in enqueue order.
//! - A queued write is removed only after the remote accepted or rejected
//!   it; an unreachable remote leaves the queue untouched.
//! - Server reads used for health probing never touch the cache or queue.
//! - Flushing, remote writes and cache refreshes run one at a time, so a
//!   refresh never overwrites a write acknowledged after its fetch began.
//! - Refresh failures are classified into the shared health state.

use super::error::{StoreError, StoreErrorCode, StoreResult};
use super::sqlite::{generate_doc_id, SqliteDocumentStore};
use super::types::{Document, DocumentPath, Query, WriteData};
use super::{DocumentStore, SetOptions};
use crate::resilience::classify::{classify, is_offline};
use crate::resilience::HealthState;
use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// One write waiting for the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum PendingWrite {
    Set {
        path: DocumentPath,
        data: WriteData,
        merge: bool,
    },
    Update {
        path: DocumentPath,
        data: WriteData,
    },
    Delete {
        path: DocumentPath,
    },
}

impl PendingWrite {
    fn path(&self) -> &DocumentPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete { path } => path,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    async fn apply(&self, store: &dyn DocumentStore) -> StoreResult<()> {
        match self {
            Self::Set { path, data, merge } => {
                store
                    .set_doc(path, data.clone(), SetOptions { merge: *merge })
                    .await
            }
            Self::Update { path, data } => store.update_doc(path, data.clone()).await,
            Self::Delete { path } => store.delete_doc(path).await,
        }
    }
}

/// Cache-first [`DocumentStore`] over a remote store.
#[derive(Clone)]
pub struct SyncedStore {
    remote: Arc<dyn DocumentStore>,
    cache: SqliteDocumentStore,
    revalidate_in_background: bool,
    health: HealthState,
    sync_gate: Arc<Mutex<()>>,
}

impl SyncedStore {
    pub fn new(
        remote: Arc<dyn DocumentStore>,
        cache: SqliteDocumentStore,
        revalidate_in_background: bool,
        health: HealthState,
    ) -> Self {
        Self {
            remote,
            cache,
            revalidate_in_background,
            health,
            sync_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn cache(&self) -> &SqliteDocumentStore {
        &self.cache
    }

    /// Replays queued offline writes against the remote.
    ///
    /// Returns the number of writes the remote accepted. Stops at the first
    /// write that fails because the remote is unreachable and reports it.
    /// Writes the remote rejects for any other reason are dropped and their
    /// local copy evicted.
    pub async fn flush_pending_writes(&self) -> StoreResult<usize> {
        let gate = self.sync_gate.lock().await;
        self.flush_locked(&gate).await
    }

    async fn flush_locked(&self, _gate: &MutexGuard<'_, ()>) -> StoreResult<usize> {
        let mut flushed = 0;
        for (seq, raw) in self.cache.pending_writes().await? {
            let write: PendingWrite = match serde_json::from_str(&raw) {
                Ok(write) => write,
                Err(err) => {
                    error!(
                        "event=pending_write_dropped module=store status=error seq={} error={}",
                        seq, err
                    );
                    self.cache.remove_pending(seq).await?;
                    continue;
                }
            };

            match write.apply(self.remote.as_ref()).await {
                Ok(()) => {
                    self.cache.remove_pending(seq).await?;
                    flushed += 1;
                }
                Err(err) if is_offline(&err) => return Err(err),
                Err(err) => {
                    error!(
                        "event=pending_write_rejected module=store status=error seq={} op={} path={} error={}",
                        seq,
                        write.name(),
                        write.path(),
                        err
                    );
                    self.cache.remove_pending(seq).await?;
                    self.cache.evict(write.path()).await?;
                }
            }
        }

        if flushed > 0 {
            debug!(
                "event=pending_writes_flushed module=store status=ok count={}",
                flushed
            );
        }
        Ok(flushed)
    }

    /// Fetches `query` from the remote and refreshes the local result set.
    pub async fn revalidate_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let gate = self.sync_gate.lock().await;
        self.flush_locked(&gate).await?;
        let docs = self.remote.run_query(query).await?;
        self.cache
            .replace_query_results(query, docs.clone())
            .await?;
        Ok(docs)
    }

    /// Fetches one document from the remote and refreshes the local copy.
    pub async fn revalidate_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        let gate = self.sync_gate.lock().await;
        self.flush_locked(&gate).await?;
        let doc = self.remote.get_doc(path).await?;
        match &doc {
            Some(doc) => self.cache.put_snapshot(&path.collection, doc.clone()).await?,
            None => self.cache.evict(path).await?,
        }
        Ok(doc)
    }

    fn spawn_query_revalidation(&self, query: &Query) {
        if !self.revalidate_in_background {
            return;
        }
        let store = self.clone();
        let query = query.clone();
        tokio::spawn(async move {
            if let Err(err) = store.revalidate_query(&query).await {
                store.report_revalidation_failure(&query.collection, &err);
            }
        });
    }

    fn spawn_doc_revalidation(&self, path: &DocumentPath) {
        if !self.revalidate_in_background {
            return;
        }
        let store = self.clone();
        let path = path.clone();
        tokio::spawn(async move {
            if let Err(err) = store.revalidate_doc(&path).await {
                store.report_revalidation_failure(&path.collection, &err);
            }
        });
    }

    fn report_revalidation_failure(&self, collection: &str, err: &StoreError) {
        log_revalidation_failure(collection, err);
        self.health.record_failure(&classify(err));
    }

    async fn commit(&self, write: PendingWrite) -> StoreResult<()> {
        let gate = self.sync_gate.lock().await;
        let remote_result = match self.flush_locked(&gate).await {
            Ok(_) => write.apply(self.remote.as_ref()).await,
            Err(err) => Err(err),
        };

        match remote_result {
            Ok(()) => {
                if let Err(err) = write.apply(&self.cache).await {
                    // The remote holds the truth; drop the stale local copy.
                    warn!(
                        "event=cache_write module=store status=error op={} path={} error={}",
                        write.name(),
                        write.path(),
                        err
                    );
                    self.cache.evict(write.path()).await?;
                }
                Ok(())
            }
            Err(err) if is_offline(&err) => {
                match write.apply(&self.cache).await {
                    Ok(()) => {}
                    // Updating a document this client never cached still
                    // reaches the remote once the queue flushes.
                    Err(local)
                        if local.code == Some(StoreErrorCode::NotFound)
                            && matches!(write, PendingWrite::Update { .. }) => {}
                    Err(local) => return Err(local),
                }
                self.cache
                    .enqueue_pending(serde_json::to_string(&write)?)
                    .await?;
                debug!(
                    "event=write_queued module=store status=degraded op={} path={}",
                    write.name(),
                    write.path()
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn log_revalidation_failure(collection: &str, err: &StoreError) {
    if is_offline(err) {
        debug!(
            "event=revalidate module=store status=degraded collection={} error={}",
            collection, err
        );
    } else {
        warn!(
            "event=revalidate module=store status=error collection={} error_code={} error={}",
            collection,
            err.code_str(),
            err
        );
    }
}

#[async_trait]
impl DocumentStore for SyncedStore {
    async fn get_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        if let Some(doc) = self.cache.get_doc(path).await? {
            self.spawn_doc_revalidation(path);
            return Ok(Some(doc));
        }
        self.revalidate_doc(path).await
    }

    async fn get_doc_from_server(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.remote.get_doc_from_server(path).await
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let cached = self.cache.run_query(query).await?;
        if !cached.is_empty() {
            self.spawn_query_revalidation(query);
            return Ok(cached);
        }

        match self.revalidate_query(query).await {
            Ok(docs) => Ok(docs),
            Err(err) if is_offline(&err) => Ok(cached),
            Err(err) => Err(err),
        }
    }

    async fn add_doc(&self, collection: &str, data: WriteData) -> StoreResult<DocumentPath> {
        let path = DocumentPath::new(collection, generate_doc_id());
        self.set_doc(&path, data, SetOptions::overwrite()).await?;
        Ok(path)
    }

    async fn set_doc(
        &self,
        path: &DocumentPath,
        data: WriteData,
        options: SetOptions,
    ) -> StoreResult<()> {
        path.validate()?;
        self.commit(PendingWrite::Set {
            path: path.clone(),
            data,
            merge: options.merge,
        })
        .await
    }

    async fn update_doc(&self, path: &DocumentPath, data: WriteData) -> StoreResult<()> {
        path.validate()?;
        self.commit(PendingWrite::Update {
            path: path.clone(),
            data,
        })
        .await
    }

    async fn delete_doc(&self, path: &DocumentPath) -> StoreResult<()> {
        path.validate()?;
        self.commit(PendingWrite::Delete { path: path.clone() })
            .await
    }
}
