//! Document store abstraction.
//!
//! # Responsibility
//! - Define the async primitives every backend exposes (get, query, add,
//!   set, update, delete).
//! - Provide the embedded SQLite engine and the cache-layered synced store.
//!
//! # Invariants
//! - Primitives report raw [`StoreError`]s; they never classify or absorb
//!   failures. That is the job of [`crate::resilience`].
//! - `delete_doc` on a missing document succeeds.
//! - `update_doc` on a missing document fails with `not-found`.

use async_trait::async_trait;

pub mod error;
pub mod sqlite;
pub mod synced;
pub mod types;

pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use sqlite::{AccessPolicy, SqliteDocumentStore};
pub use synced::SyncedStore;
pub use types::{
    DocId, Document, DocumentPath, Direction, FieldFilter, FieldValue, Fields, OrderBy, Query,
    WriteData,
};

/// Options for [`DocumentStore::set_doc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetOptions {
    /// Keep fields absent from the write instead of replacing the document.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn overwrite() -> Self {
        Self { merge: false }
    }
}

/// Async document store primitives.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document; `Ok(None)` when it does not exist.
    async fn get_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>>;

    /// Reads one document bypassing any local cache.
    async fn get_doc_from_server(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.get_doc(path).await
    }

    /// Runs a filtered, ordered query inside the store.
    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Counts documents matching `query`.
    async fn count(&self, query: &Query) -> StoreResult<usize> {
        Ok(self.run_query(query).await?.len())
    }

    /// Creates a document with a generated id.
    async fn add_doc(&self, collection: &str, data: WriteData) -> StoreResult<DocumentPath>;

    /// Creates or replaces (or merges into) the document at `path`.
    async fn set_doc(
        &self,
        path: &DocumentPath,
        data: WriteData,
        options: SetOptions,
    ) -> StoreResult<()>;

    /// Merges fields into an existing document.
    async fn update_doc(&self, path: &DocumentPath, data: WriteData) -> StoreResult<()>;

    async fn delete_doc(&self, path: &DocumentPath) -> StoreResult<()>;
}
