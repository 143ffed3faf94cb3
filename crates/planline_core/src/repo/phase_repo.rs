//! Phase and subphase repositories.
//!
//! Both collections share one shape: a parent id field, a schedule and a
//! manual `orderIndex`. Reads are scoped to one parent and sorted by
//! `orderIndex` ascending. Siblings of other parents never show up.

use super::{decode_docs, next_order_index, set_or_clear, PHASES, SUBPHASES};
use crate::model::phase::{NewPhase, NewSubphase, Phase, StageDraft, StagePatch, Subphase};
use crate::model::{TenantId, ValidationError};
use crate::resilience::Resilient;
use crate::store::{DocId, DocumentPath, Direction, Query, WriteData};
use log::warn;
use serde::de::DeserializeOwned;

/// Collection layout shared by phases and subphases.
#[derive(Clone)]
struct StageCollection {
    guard: Resilient,
    tenant: TenantId,
    collection: &'static str,
    parent_field: &'static str,
}

impl StageCollection {
    fn children_query(&self, parent_id: &str) -> Query {
        Query::collection(self.collection)
            .where_eq(self.parent_field, parent_id)
            .order_by("orderIndex", Direction::Ascending)
    }

    async fn list<T>(&self, op: &'static str, parent_id: &str) -> Vec<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = self.children_query(parent_id);
        let collection = self.collection;
        self.guard
            .or_fallback(op, Vec::new(), |store| async move {
                let docs = store.run_query(&query).await?;
                Ok(decode_docs(collection, docs))
            })
            .await
    }

    async fn add(
        &self,
        op: &'static str,
        parent_id: DocId,
        draft: StageDraft,
        checked: Result<(), ValidationError>,
    ) -> Option<DocId> {
        if let Err(err) = checked {
            warn!("event={} module=repo status=rejected error={}", op, err);
            return None;
        }
        let count_query = self.children_query(&parent_id);
        let collection = self.collection;
        let data = WriteData::new()
            .set(self.parent_field, parent_id)
            .set("ownerId", self.tenant.as_str())
            .set("title", draft.title)
            .set_opt("notes", draft.notes)
            .set("startAt", draft.start_at)
            .set("endAt", draft.end_at)
            .set("done", draft.done)
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");
        self.guard
            .or_none(op, |store| async move {
                let order_index = match draft.order_index {
                    Some(order_index) => order_index,
                    None => next_order_index(store.count(&count_query).await?),
                };
                let path = store
                    .add_doc(collection, data.set("orderIndex", order_index))
                    .await?;
                Ok(path.id)
            })
            .await
    }

    async fn update(&self, op: &'static str, id: &str, patch: StagePatch) -> Option<DocId> {
        if let Err(err) = patch.validate() {
            warn!("event={} module=repo status=rejected id={} error={}", op, id, err);
            return None;
        }
        let path = DocumentPath::new(self.collection, id);
        let data = set_or_clear(
            WriteData::new()
                .set_opt("title", patch.title)
                .set_opt("startAt", patch.start_at)
                .set_opt("endAt", patch.end_at)
                .set_opt("done", patch.done)
                .set_opt("orderIndex", patch.order_index),
            "notes",
            patch.notes,
        )
        .server_timestamp("updatedAt");
        self.guard
            .or_none(op, |store| async move {
                store.update_doc(&path, data).await?;
                Ok(path.id)
            })
            .await
    }

    async fn delete(&self, op: &'static str, id: &str) -> Option<DocId> {
        let path = DocumentPath::new(self.collection, id);
        self.guard
            .or_none(op, |store| async move {
                store.delete_doc(&path).await?;
                Ok(path.id)
            })
            .await
    }
}

/// Phases of one project.
#[derive(Clone)]
pub struct PhaseRepository {
    inner: StageCollection,
}

impl PhaseRepository {
    pub fn new(guard: Resilient, tenant: TenantId) -> Self {
        Self {
            inner: StageCollection {
                guard,
                tenant,
                collection: PHASES,
                parent_field: "projectId",
            },
        }
    }

    /// Phases of `project_id`, `orderIndex` ascending. Empty on failure.
    pub async fn get_phases(&self, project_id: &str) -> Vec<Phase> {
        self.inner.list("phases.list", project_id).await
    }

    pub async fn add_phase(&self, input: NewPhase) -> Option<DocId> {
        let checked = input.validate();
        self.inner
            .add("phases.add", input.project_id, input.draft, checked)
            .await
    }

    pub async fn update_phase(&self, id: &str, patch: StagePatch) -> Option<DocId> {
        self.inner.update("phases.update", id, patch).await
    }

    pub async fn delete_phase(&self, id: &str) -> Option<DocId> {
        self.inner.delete("phases.delete", id).await
    }
}

/// Subphases of one phase.
#[derive(Clone)]
pub struct SubphaseRepository {
    inner: StageCollection,
}

impl SubphaseRepository {
    pub fn new(guard: Resilient, tenant: TenantId) -> Self {
        Self {
            inner: StageCollection {
                guard,
                tenant,
                collection: SUBPHASES,
                parent_field: "phaseId",
            },
        }
    }

    /// Subphases of `phase_id`, `orderIndex` ascending. Empty on failure.
    pub async fn get_subphases(&self, phase_id: &str) -> Vec<Subphase> {
        self.inner.list("subphases.list", phase_id).await
    }

    pub async fn add_subphase(&self, input: NewSubphase) -> Option<DocId> {
        let checked = input.validate();
        self.inner
            .add("subphases.add", input.phase_id, input.draft, checked)
            .await
    }

    pub async fn update_subphase(&self, id: &str, patch: StagePatch) -> Option<DocId> {
        self.inner.update("subphases.update", id, patch).await
    }

    pub async fn delete_subphase(&self, id: &str) -> Option<DocId> {
        self.inner.delete("subphases.delete", id).await
    }
}
