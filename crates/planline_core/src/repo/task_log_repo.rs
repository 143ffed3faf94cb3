//! Activity log repository. Logs are append-only.

use super::{decode_docs, TASK_LOGS};
use crate::model::task_log::{NewTaskLog, TaskLog};
use crate::model::TenantId;
use crate::resilience::Resilient;
use crate::store::{DocId, Direction, Query, WriteData};
use log::warn;

#[derive(Clone)]
pub struct TaskLogRepository {
    guard: Resilient,
    tenant: TenantId,
}

impl TaskLogRepository {
    pub fn new(guard: Resilient, tenant: TenantId) -> Self {
        Self { guard, tenant }
    }

    /// Tenant logs, newest first. Empty on failure.
    pub async fn get_logs(&self) -> Vec<TaskLog> {
        let query = Query::collection(TASK_LOGS)
            .where_eq("ownerId", self.tenant.as_str())
            .order_by("createdAt", Direction::Descending);
        self.guard
            .or_fallback("task_logs.list", Vec::new(), |store| async move {
                let docs = store.run_query(&query).await?;
                Ok(decode_docs(TASK_LOGS, docs))
            })
            .await
    }

    pub async fn add_log(&self, input: NewTaskLog) -> Option<DocId> {
        if let Err(err) = input.validate() {
            warn!("event=task_logs.add module=repo status=rejected error={}", err);
            return None;
        }
        let data = WriteData::new()
            .set("ownerId", self.tenant.as_str())
            .set("title", input.title)
            .set("details", input.details)
            .set_opt("relatedProjectId", input.related_project_id)
            .server_timestamp("createdAt");
        self.guard
            .or_none("task_logs.add", |store| async move {
                let path = store.add_doc(TASK_LOGS, data).await?;
                Ok(path.id)
            })
            .await
    }
}
