//! Reminder use-cases: creation, status lifecycle and due-date windows.

use super::{ServiceError, ServiceResult};
use crate::model::reminder::{
    NewReminder, Reminder, ReminderPatch, ReminderStatus, ReminderWindow,
};
use crate::model::task_log::NewTaskLog;
use crate::repo::reminder_repo::ReminderRepository;
use crate::repo::task_log_repo::TaskLogRepository;
use crate::store::DocId;
use chrono::{DateTime, FixedOffset};
use log::warn;

#[derive(Clone)]
pub struct ReminderService {
    reminders: ReminderRepository,
    logs: TaskLogRepository,
}

impl ReminderService {
    pub fn new(reminders: ReminderRepository, logs: TaskLogRepository) -> Self {
        Self { reminders, logs }
    }

    /// Creates an active reminder and records it in the activity log.
    pub async fn create_reminder(&self, input: NewReminder) -> ServiceResult<DocId> {
        let title = input.title.clone();
        let Some(id) = self.reminders.add_reminder(input).await else {
            return Err(ServiceError::WriteNotApplied {
                action: "create the reminder",
            });
        };
        let entry = NewTaskLog::new("Reminder created", format!("New reminder: \"{title}\""));
        if self.logs.add_log(entry).await.is_none() {
            warn!("event=activity_log module=service status=skipped action=reminder_create");
        }
        Ok(id)
    }

    /// Flips `done` and `active`. Returns the new status.
    pub async fn toggle_done(&self, reminder: &Reminder) -> ServiceResult<ReminderStatus> {
        let next = match reminder.status {
            ReminderStatus::Done => ReminderStatus::Active,
            _ => ReminderStatus::Done,
        };
        self.transition(reminder, next, ReminderPatch::status(next), "update the reminder")
            .await
    }

    /// Postpones an active reminder until `until` (epoch milliseconds).
    pub async fn snooze(&self, reminder: &Reminder, until: i64) -> ServiceResult<ReminderStatus> {
        let patch = ReminderPatch {
            snooze_until: Some(Some(until)),
            ..ReminderPatch::status(ReminderStatus::Snoozed)
        };
        self.transition(reminder, ReminderStatus::Snoozed, patch, "snooze the reminder")
            .await
    }

    /// Reactivates a snoozed reminder and clears its snooze deadline.
    pub async fn wake(&self, reminder: &Reminder) -> ServiceResult<ReminderStatus> {
        let patch = ReminderPatch {
            snooze_until: Some(None),
            ..ReminderPatch::status(ReminderStatus::Active)
        };
        self.transition(reminder, ReminderStatus::Active, patch, "update the reminder")
            .await
    }

    /// Tenant reminders inside `window` at local time `now`, soonest first.
    pub async fn in_window(
        &self,
        window: ReminderWindow,
        now: DateTime<FixedOffset>,
    ) -> Vec<Reminder> {
        self.reminders
            .get_reminders()
            .await
            .into_iter()
            .filter(|reminder| window.contains(reminder, now))
            .collect()
    }

    async fn transition(
        &self,
        reminder: &Reminder,
        next: ReminderStatus,
        patch: ReminderPatch,
        action: &'static str,
    ) -> ServiceResult<ReminderStatus> {
        if !reminder.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: reminder.status,
                to: next,
            });
        }
        match self.reminders.update_reminder(&reminder.id, patch).await {
            Some(_) => Ok(next),
            None => Err(ServiceError::WriteNotApplied { action }),
        }
    }
}
