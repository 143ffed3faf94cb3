//! Reminder entity, status transitions and due-date windows.
//!
//! # Invariants
//! - New reminders always start `active`.
//! - Status moves only along `active <-> done` and
//!   `active -> snoozed -> active`.
//! - A snoozed reminder is due at `snoozeUntil` when set.

use super::{require_text, ValidationError};
use crate::store::DocId;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};

/// Width of the "upcoming" window.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Project,
    Phase,
    Subphase,
    #[default]
    General,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Phase => "phase",
            Self::Subphase => "subphase",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    Low,
    #[default]
    Med,
    High,
}

impl ReminderPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Active,
    Done,
    Snoozed,
}

impl ReminderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Done => "done",
            Self::Snoozed => "snoozed",
        }
    }

    /// Whether moving from `self` to `next` is allowed. Staying put is.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Done)
                | (Self::Done, Self::Active)
                | (Self::Active, Self::Snoozed)
                | (Self::Snoozed, Self::Active)
        ) || self == next
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: DocId,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<DocId>,
    /// Epoch milliseconds.
    pub remind_at: i64,
    #[serde(default)]
    pub priority: ReminderPriority,
    #[serde(default)]
    pub status: ReminderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snooze_until: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl Reminder {
    /// Moment the reminder is due, honoring an active snooze.
    pub fn due_at(&self) -> i64 {
        match (self.status, self.snooze_until) {
            (ReminderStatus::Snoozed, Some(until)) => until,
            _ => self.remind_at,
        }
    }
}

/// Input for `add_reminder`. Status is not settable: new reminders are active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub title: String,
    pub details: Option<String>,
    pub target_type: TargetType,
    pub target_id: Option<DocId>,
    pub remind_at: i64,
    pub priority: ReminderPriority,
}

impl NewReminder {
    /// General, medium-priority reminder.
    pub fn new(title: impl Into<String>, remind_at: i64) -> Self {
        Self {
            title: title.into(),
            details: None,
            target_type: TargetType::General,
            target_id: None,
            remind_at,
            priority: ReminderPriority::Med,
        }
    }

    pub fn targeting(mut self, target_type: TargetType, target_id: impl Into<DocId>) -> Self {
        self.target_type = target_type;
        self.target_id = Some(target_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        if self.target_type != TargetType::General {
            require_text("targetId", self.target_id.as_deref().unwrap_or_default())?;
        }
        Ok(())
    }
}

/// Partial reminder update. Any field, including status, may change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub details: Option<Option<String>>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<Option<DocId>>,
    pub remind_at: Option<i64>,
    pub priority: Option<ReminderPriority>,
    pub status: Option<ReminderStatus>,
    /// `Some(None)` clears the snooze deadline.
    pub snooze_until: Option<Option<i64>>,
}

impl ReminderPatch {
    pub fn status(status: ReminderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) => require_text("title", title),
            None => Ok(()),
        }
    }
}

/// Due-date views offered by the reminders screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    /// Due during the local calendar day of `now`.
    Today,
    /// Due from now up to [`UPCOMING_WINDOW_DAYS`] ahead.
    Upcoming,
    /// Past due and not done.
    Overdue,
}

impl ReminderWindow {
    /// Whether `reminder` belongs to this window at local time `now`.
    pub fn contains(self, reminder: &Reminder, now: DateTime<FixedOffset>) -> bool {
        let due = reminder.due_at();
        let now_ms = now.timestamp_millis();
        match self {
            Self::Today => {
                let (start, end) = local_day_bounds(now);
                start <= due && due < end
            }
            Self::Upcoming => {
                now_ms <= due && due < now_ms + Duration::days(UPCOMING_WINDOW_DAYS).num_milliseconds()
            }
            Self::Overdue => reminder.status != ReminderStatus::Done && due < now_ms,
        }
    }
}

fn local_day_bounds(now: DateTime<FixedOffset>) -> (i64, i64) {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).single());
    match midnight {
        Some(start) => {
            let start_ms = start.timestamp_millis();
            (start_ms, start_ms + Duration::days(1).num_milliseconds())
        }
        // Fixed offsets have no gaps; fall back to a rolling day anyway.
        None => {
            let now_ms = now.timestamp_millis();
            (now_ms, now_ms + Duration::days(1).num_milliseconds())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(remind_at: i64, status: ReminderStatus) -> Reminder {
        Reminder {
            id: "r".to_string(),
            owner_id: "demo".to_string(),
            title: "Review contract".to_string(),
            details: None,
            target_type: TargetType::General,
            target_id: None,
            remind_at,
            priority: ReminderPriority::Med,
            status,
            snooze_until: None,
            created_at: 0,
        }
    }

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).expect("valid timestamp")
    }

    #[test]
    fn transitions_follow_the_lifecycle() {
        use ReminderStatus::*;
        assert!(Active.can_transition_to(Done));
        assert!(Done.can_transition_to(Active));
        assert!(Active.can_transition_to(Snoozed));
        assert!(Snoozed.can_transition_to(Active));
        assert!(Done.can_transition_to(Done));
        assert!(!Done.can_transition_to(Snoozed));
        assert!(!Snoozed.can_transition_to(Done));
    }

    #[test]
    fn windows_split_today_upcoming_and_overdue() {
        let now = at("2026-03-10T15:00:00-03:00");
        let hour = 60 * 60 * 1000;
        let now_ms = now.timestamp_millis();

        let earlier_today = reminder(now_ms - 2 * hour, ReminderStatus::Active);
        assert!(ReminderWindow::Today.contains(&earlier_today, now));
        assert!(ReminderWindow::Overdue.contains(&earlier_today, now));
        assert!(!ReminderWindow::Upcoming.contains(&earlier_today, now));

        let in_three_days = reminder(now_ms + 72 * hour, ReminderStatus::Active);
        assert!(ReminderWindow::Upcoming.contains(&in_three_days, now));
        assert!(!ReminderWindow::Today.contains(&in_three_days, now));

        let done_yesterday = reminder(now_ms - 24 * hour, ReminderStatus::Done);
        assert!(!ReminderWindow::Overdue.contains(&done_yesterday, now));
    }

    #[test]
    fn snoozed_reminder_is_due_at_snooze_deadline() {
        let now = at("2026-03-10T09:00:00+00:00");
        let mut snoozed = reminder(now.timestamp_millis() - 1_000, ReminderStatus::Snoozed);
        snoozed.snooze_until = Some(now.timestamp_millis() + 60_000);
        assert!(!ReminderWindow::Overdue.contains(&snoozed, now));
        assert!(ReminderWindow::Upcoming.contains(&snoozed, now));
    }

    #[test]
    fn targeted_reminder_requires_target_id() {
        let mut input = NewReminder::new("Ship", 0);
        input.target_type = TargetType::Project;
        assert!(input.validate().is_err());
        assert!(input.targeting(TargetType::Project, "p1").validate().is_ok());
    }
}
