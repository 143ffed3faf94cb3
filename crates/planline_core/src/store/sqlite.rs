//! Embedded SQLite document engine.
//!
//! # Responsibility
//! - Persist JSON documents per collection and evaluate queries in SQL.
//! - Serve as the durable local cache under [`super::SyncedStore`] and as a
//!   local emulator for the hosted store (access policy, reachability).
//! - Hold the durable queue of writes made while the remote was unreachable.
//!
//! # Invariants
//! - Server timestamps come from a per-engine clock that never repeats or
//!   goes backwards, so `createdAt` ordering is total.
//! - Queries skip documents lacking an ordered field.
//! - Blocking SQLite work runs on the blocking thread pool.

use super::error::{StoreError, StoreResult};
use super::types::{DocId, Document, DocumentPath, Fields, Query, WriteData};
use super::{DocumentStore, SetOptions};
use crate::config::TabManager;
use crate::db::{open_db, open_db_in_memory, DbResult};
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const PERMISSION_DENIED_MESSAGE: &str = "Missing or insufficient permissions.";
const OFFLINE_MESSAGE: &str = "Failed to reach the document store because the client is offline.";

/// Access rules enforced by the engine when it emulates the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    #[default]
    AllowAll,
    ReadOnly,
    DenyAll,
}

impl AccessPolicy {
    fn to_u8(self) -> u8 {
        match self {
            Self::AllowAll => 0,
            Self::ReadOnly => 1,
            Self::DenyAll => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::ReadOnly,
            2 => Self::DenyAll,
            _ => Self::AllowAll,
        }
    }
}

struct EngineState {
    conn: Mutex<Connection>,
    last_timestamp_ms: AtomicI64,
    policy: AtomicU8,
    reachable: AtomicBool,
}

impl EngineState {
    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = match self.last_timestamp_ms.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |last| Some(now.max(last + 1)),
        ) {
            Ok(previous) | Err(previous) => previous,
        };
        now.max(previous + 1)
    }
}

/// SQLite-backed [`DocumentStore`].
#[derive(Clone)]
pub struct SqliteDocumentStore {
    state: Arc<EngineState>,
}

impl SqliteDocumentStore {
    /// Opens a file-backed engine shared according to `tabs`.
    pub fn open(path: impl AsRef<Path>, tabs: TabManager) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path, tabs)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            state: Arc::new(EngineState {
                conn: Mutex::new(conn),
                last_timestamp_ms: AtomicI64::new(0),
                policy: AtomicU8::new(AccessPolicy::AllowAll.to_u8()),
                reachable: AtomicBool::new(true),
            }),
        }
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::from_u8(self.state.policy.load(Ordering::SeqCst))
    }

    pub fn set_access_policy(&self, policy: AccessPolicy) {
        self.state.policy.store(policy.to_u8(), Ordering::SeqCst);
    }

    /// Emulates losing (or regaining) the network path to this engine.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.state.reachable.load(Ordering::SeqCst)
    }

    /// Number of queued offline writes.
    pub async fn pending_count(&self) -> StoreResult<usize> {
        self.with_conn(|conn, _| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM pending_writes;", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
    }

    pub(crate) async fn enqueue_pending(&self, op_json: String) -> StoreResult<i64> {
        self.with_conn(move |conn, state| {
            conn.execute(
                "INSERT INTO pending_writes (op, queued_at) VALUES (?1, ?2);",
                params![op_json, state.next_timestamp()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub(crate) async fn pending_writes(&self) -> StoreResult<Vec<(i64, String)>> {
        self.with_conn(|conn, _| {
            let mut stmt = conn.prepare("SELECT seq, op FROM pending_writes ORDER BY seq ASC;")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut pending = Vec::new();
            for row in rows {
                pending.push(row?);
            }
            Ok(pending)
        })
        .await
    }

    pub(crate) async fn remove_pending(&self, seq: i64) -> StoreResult<()> {
        self.with_conn(move |conn, _| {
            conn.execute("DELETE FROM pending_writes WHERE seq = ?1;", [seq])?;
            Ok(())
        })
        .await
    }

    /// Stores an already resolved snapshot, replacing any local copy.
    pub(crate) async fn put_snapshot(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let path = DocumentPath::new(collection, doc.id);
        let fields = doc.fields;
        self.with_conn(move |conn, _| store_fields(conn, &path, &fields))
            .await
    }

    /// Replaces the local result set of `query` with `docs`.
    ///
    /// Local documents that match the query but are absent from `docs` were
    /// deleted remotely and are dropped. Limited queries only upsert, since a
    /// missing document may simply lie beyond the limit.
    pub(crate) async fn replace_query_results(
        &self,
        query: &Query,
        docs: Vec<Document>,
    ) -> StoreResult<()> {
        query.validate()?;
        let query = query.clone();
        self.with_conn(move |conn, _| {
            let tx = conn.transaction()?;
            if query.limit.is_none() {
                let keep: HashSet<&str> = docs.iter().map(|doc| doc.id.as_str()).collect();
                let unbounded = Query {
                    order_by: Vec::new(),
                    ..query.clone()
                };
                for stale in query_docs(&tx, &unbounded)? {
                    if !keep.contains(stale.id.as_str()) {
                        delete_fields(&tx, &DocumentPath::new(&query.collection, stale.id))?;
                    }
                }
            }
            for doc in &docs {
                store_fields(
                    &tx,
                    &DocumentPath::new(&query.collection, doc.id.clone()),
                    &doc.fields,
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Removes a local copy without touching the pending queue.
    pub(crate) async fn evict(&self, path: &DocumentPath) -> StoreResult<()> {
        let path = path.clone();
        self.with_conn(move |conn, _| delete_fields(conn, &path)).await
    }

    fn check_access(&self, write: bool) -> StoreResult<()> {
        if !self.is_reachable() {
            return Err(StoreError::unavailable(OFFLINE_MESSAGE));
        }
        match (self.access_policy(), write) {
            (AccessPolicy::AllowAll, _) | (AccessPolicy::ReadOnly, false) => Ok(()),
            _ => Err(StoreError::permission_denied(PERMISSION_DENIED_MESSAGE)),
        }
    }

    async fn with_conn<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &EngineState) -> StoreResult<T> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let mut conn = state
                .conn
                .lock()
                .map_err(|_| StoreError::internal("document engine connection poisoned"))?;
            op(&mut conn, &state)
        })
        .await
        .map_err(|err| StoreError::internal(format!("document engine task failed: {err}")))?
    }

    async fn write(
        &self,
        path: DocumentPath,
        data: WriteData,
        mode: WriteMode,
    ) -> StoreResult<()> {
        path.validate()?;
        data.validate()?;
        self.with_conn(move |conn, state| {
            let tx = conn.transaction()?;
            let mut fields = match mode {
                WriteMode::Overwrite => Fields::new(),
                WriteMode::Merge => load_fields(&tx, &path)?.unwrap_or_default(),
                WriteMode::Update => load_fields(&tx, &path)?.ok_or_else(|| {
                    StoreError::not_found(format!("No document to update: {path}"))
                })?,
            };
            data.apply_to(&mut fields, state.next_timestamp());
            store_fields(&tx, &path, &fields)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Overwrite,
    Merge,
    Update,
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_doc(&self, path: &DocumentPath) -> StoreResult<Option<Document>> {
        self.check_access(false)?;
        path.validate()?;
        let path = path.clone();
        self.with_conn(move |conn, _| {
            Ok(load_fields(conn, &path)?.map(|fields| Document {
                id: path.id.clone(),
                fields,
            }))
        })
        .await
    }

    async fn run_query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.check_access(false)?;
        query.validate()?;
        let query = query.clone();
        self.with_conn(move |conn, _| query_docs(conn, &query)).await
    }

    async fn add_doc(&self, collection: &str, data: WriteData) -> StoreResult<DocumentPath> {
        self.check_access(true)?;
        let path = DocumentPath::new(collection, generate_doc_id());
        self.write(path.clone(), data, WriteMode::Overwrite).await?;
        Ok(path)
    }

    async fn set_doc(
        &self,
        path: &DocumentPath,
        data: WriteData,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.check_access(true)?;
        let mode = if options.merge {
            WriteMode::Merge
        } else {
            WriteMode::Overwrite
        };
        self.write(path.clone(), data, mode).await
    }

    async fn update_doc(&self, path: &DocumentPath, data: WriteData) -> StoreResult<()> {
        self.check_access(true)?;
        self.write(path.clone(), data, WriteMode::Update).await
    }

    async fn delete_doc(&self, path: &DocumentPath) -> StoreResult<()> {
        self.check_access(true)?;
        path.validate()?;
        self.evict(path).await
    }
}

/// Generates a new document id.
pub fn generate_doc_id() -> DocId {
    Uuid::new_v4().simple().to_string()
}

fn load_fields(conn: &Connection, path: &DocumentPath) -> StoreResult<Option<Fields>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2;",
            params![path.collection, path.id],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|raw| parse_fields(&raw)).transpose()
}

fn store_fields(conn: &Connection, path: &DocumentPath, fields: &Fields) -> StoreResult<()> {
    let data = serde_json::to_string(fields)?;
    conn.execute(
        "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)
         ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data;",
        params![path.collection, path.id, data],
    )?;
    Ok(())
}

fn delete_fields(conn: &Connection, path: &DocumentPath) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
        params![path.collection, path.id],
    )?;
    Ok(())
}

fn query_docs(conn: &Connection, query: &Query) -> StoreResult<Vec<Document>> {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
    let mut bind_values = vec![SqlValue::Text(query.collection.clone())];

    for filter in &query.filters {
        let extract = format!("json_extract(data, '$.{}')", filter.field);
        match json_to_sql(&filter.value) {
            Some(value) => {
                sql.push_str(&format!(" AND {extract} = ?"));
                bind_values.push(value);
            }
            None => sql.push_str(&format!(" AND {extract} IS NULL")),
        }
    }

    for order in &query.order_by {
        sql.push_str(&format!(
            " AND json_type(data, '$.{}') IS NOT NULL",
            order.field
        ));
    }

    sql.push_str(" ORDER BY ");
    for order in &query.order_by {
        sql.push_str(&format!(
            "json_extract(data, '$.{}') {}, ",
            order.field,
            order.direction.as_sql()
        ));
    }
    sql.push_str("rowid ASC");

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(SqlValue::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut docs = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let raw: String = row.get(1)?;
        docs.push(Document {
            id,
            fields: parse_fields(&raw)?,
        });
    }
    Ok(docs)
}

fn json_to_sql(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => Some(match number.as_i64() {
            Some(int) => SqlValue::Integer(int),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        }),
        Value::String(text) => Some(SqlValue::Text(text.clone())),
        // Rejected by `Query::validate`.
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_fields(raw: &str) -> StoreResult<Fields> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::new(
            super::StoreErrorCode::DataLoss,
            "stored document is not a JSON object",
        )),
    }
}
