//! Project repository.
//!
//! # Invariants
//! - Lists are scoped to the tenant and sorted by `orderIndex` ascending.
//! - `add_project` defaults `orderIndex` to the current project count and
//!   `status` to `active`.
//! - Deleting a project leaves its phases in place (no cascade).

use super::{decode_docs, next_order_index, set_or_clear, PROJECTS};
use crate::model::project::{NewProject, Project, ProjectPatch, ProjectStatus};
use crate::model::TenantId;
use crate::resilience::Resilient;
use crate::store::{DocId, DocumentPath, Direction, Query, WriteData};
use log::warn;

#[derive(Clone)]
pub struct ProjectRepository {
    guard: Resilient,
    tenant: TenantId,
}

impl ProjectRepository {
    pub fn new(guard: Resilient, tenant: TenantId) -> Self {
        Self { guard, tenant }
    }

    fn tenant_query(&self) -> Query {
        Query::collection(PROJECTS)
            .where_eq("ownerId", self.tenant.as_str())
            .order_by("orderIndex", Direction::Ascending)
    }

    /// All tenant projects, `orderIndex` ascending. Empty on failure.
    pub async fn get_projects(&self) -> Vec<Project> {
        let query = self.tenant_query();
        self.guard
            .or_fallback("projects.list", Vec::new(), |store| async move {
                let docs = store.run_query(&query).await?;
                Ok(decode_docs(PROJECTS, docs))
            })
            .await
    }

    /// Creates a project and returns its id, or `None` when nothing was written.
    pub async fn add_project(&self, input: NewProject) -> Option<DocId> {
        if let Err(err) = input.validate() {
            warn!("event=projects.add module=repo status=rejected error={}", err);
            return None;
        }
        let count_query = self.tenant_query();
        let owner = self.tenant.as_str().to_string();
        self.guard
            .or_none("projects.add", |store| async move {
                let order_index = match input.order_index {
                    Some(order_index) => order_index,
                    None => next_order_index(store.count(&count_query).await?),
                };
                let data = WriteData::new()
                    .set("ownerId", owner)
                    .set("name", input.name)
                    .set_opt("description", input.description)
                    .set("status", input.status.unwrap_or_default().as_str())
                    .set("orderIndex", order_index)
                    .server_timestamp("createdAt")
                    .server_timestamp("updatedAt");
                let path = store.add_doc(PROJECTS, data).await?;
                Ok(path.id)
            })
            .await
    }

    /// Applies a partial update and refreshes `updatedAt`.
    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> Option<DocId> {
        if let Err(err) = patch.validate() {
            warn!(
                "event=projects.update module=repo status=rejected id={} error={}",
                id, err
            );
            return None;
        }
        let path = DocumentPath::new(PROJECTS, id);
        let data = set_or_clear(
            WriteData::new()
                .set_opt("name", patch.name)
                .set_opt("status", patch.status.map(ProjectStatus::as_str))
                .set_opt("orderIndex", patch.order_index),
            "description",
            patch.description,
        )
        .server_timestamp("updatedAt");
        self.guard
            .or_none("projects.update", |store| async move {
                store.update_doc(&path, data).await?;
                Ok(path.id)
            })
            .await
    }

    /// Deletes one project. Its phases and subphases are not removed.
    pub async fn delete_project(&self, id: &str) -> Option<DocId> {
        let path = DocumentPath::new(PROJECTS, id);
        self.guard
            .or_none("projects.delete", |store| async move {
                store.delete_doc(&path).await?;
                Ok(path.id)
            })
            .await
    }
}
