//! Entity repositories built on the resilient wrapper.
//!
//! # Responsibility
//! - Translate typed entity operations into store queries and writes.
//! - Keep ordering and scoping inside the store query.
//!
//! # Invariants
//! - Repository methods never return errors: lists fall back to an empty
//!   `Vec`, mutations to `None`.
//! - Project, phase and subphase writes always refresh `updatedAt`.
//! - Malformed documents are skipped with a warning, not surfaced.

use crate::store::{Document, WriteData};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod phase_repo;
pub mod project_repo;
pub mod reminder_repo;
pub mod settings_repo;
pub mod task_log_repo;

pub const PROJECTS: &str = "projects";
pub const PHASES: &str = "phases";
pub const SUBPHASES: &str = "subphases";
pub const TASK_LOGS: &str = "taskLogs";
pub const REMINDERS: &str = "reminders";
pub const USER_SETTINGS: &str = "userSettings";

pub(crate) fn decode_docs<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| decode_doc(collection, doc))
        .collect()
}

pub(crate) fn decode_doc<T: DeserializeOwned>(collection: &str, doc: Document) -> Option<T> {
    let id = doc.id.clone();
    match serde_json::from_value(doc.into_value()) {
        Ok(entity) => Some(entity),
        Err(err) => {
            warn!(
                "event=decode module=repo status=skipped collection={} id={} error={}",
                collection, id, err
            );
            None
        }
    }
}

/// Sets `field` for `Some(Some(v))`, deletes it for `Some(None)`.
pub(crate) fn set_or_clear<V: Into<Value>>(
    data: WriteData,
    field: &str,
    value: Option<Option<V>>,
) -> WriteData {
    match value {
        Some(Some(value)) => data.set(field, value),
        Some(None) => data.delete(field),
        None => data,
    }
}

/// Converts a store count into the next `orderIndex`.
pub(crate) fn next_order_index(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
