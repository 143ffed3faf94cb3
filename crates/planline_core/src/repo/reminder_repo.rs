//! Reminder repository.
//!
//! # Invariants
//! - Lists are scoped to the tenant and sorted by `remindAt` ascending.
//! - `add_reminder` always writes `status = active`.

use super::{decode_docs, set_or_clear, REMINDERS};
use crate::model::reminder::{
    NewReminder, Reminder, ReminderPatch, ReminderPriority, ReminderStatus, TargetType,
};
use crate::model::TenantId;
use crate::resilience::Resilient;
use crate::store::{DocId, DocumentPath, Direction, Query, WriteData};
use log::warn;

#[derive(Clone)]
pub struct ReminderRepository {
    guard: Resilient,
    tenant: TenantId,
}

impl ReminderRepository {
    pub fn new(guard: Resilient, tenant: TenantId) -> Self {
        Self { guard, tenant }
    }

    /// Tenant reminders, soonest first. Empty on failure.
    pub async fn get_reminders(&self) -> Vec<Reminder> {
        let query = Query::collection(REMINDERS)
            .where_eq("ownerId", self.tenant.as_str())
            .order_by("remindAt", Direction::Ascending);
        self.guard
            .or_fallback("reminders.list", Vec::new(), |store| async move {
                let docs = store.run_query(&query).await?;
                Ok(decode_docs(REMINDERS, docs))
            })
            .await
    }

    pub async fn add_reminder(&self, input: NewReminder) -> Option<DocId> {
        if let Err(err) = input.validate() {
            warn!("event=reminders.add module=repo status=rejected error={}", err);
            return None;
        }
        let data = WriteData::new()
            .set("ownerId", self.tenant.as_str())
            .set("title", input.title)
            .set_opt("details", input.details)
            .set("targetType", input.target_type.as_str())
            .set_opt("targetId", input.target_id)
            .set("remindAt", input.remind_at)
            .set("priority", input.priority.as_str())
            .set("status", ReminderStatus::Active.as_str())
            .server_timestamp("createdAt");
        self.guard
            .or_none("reminders.add", |store| async move {
                let path = store.add_doc(REMINDERS, data).await?;
                Ok(path.id)
            })
            .await
    }

    pub async fn update_reminder(&self, id: &str, patch: ReminderPatch) -> Option<DocId> {
        if let Err(err) = patch.validate() {
            warn!(
                "event=reminders.update module=repo status=rejected id={} error={}",
                id, err
            );
            return None;
        }
        let path = DocumentPath::new(REMINDERS, id);
        let data = WriteData::new()
            .set_opt("title", patch.title)
            .set_opt("targetType", patch.target_type.map(TargetType::as_str))
            .set_opt("remindAt", patch.remind_at)
            .set_opt("priority", patch.priority.map(ReminderPriority::as_str))
            .set_opt("status", patch.status.map(ReminderStatus::as_str));
        let data = set_or_clear(data, "details", patch.details);
        let data = set_or_clear(data, "targetId", patch.target_id);
        let data = set_or_clear(data, "snoozeUntil", patch.snooze_until);
        self.guard
            .or_none("reminders.update", |store| async move {
                store.update_doc(&path, data).await?;
                Ok(path.id)
            })
            .await
    }

    pub async fn delete_reminder(&self, id: &str) -> Option<DocId> {
        let path = DocumentPath::new(REMINDERS, id);
        self.guard
            .or_none("reminders.delete", |store| async move {
                store.delete_doc(&path).await?;
                Ok(path.id)
            })
            .await
    }
}
