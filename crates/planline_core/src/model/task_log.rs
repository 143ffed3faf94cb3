//! Append-only activity log entries.

use super::{require_text, ValidationError};
use crate::store::DocId;
use serde::{Deserialize, Serialize};

/// Stored log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    pub id: DocId,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_project_id: Option<DocId>,
    #[serde(default)]
    pub created_at: i64,
}

/// Input for `add_log`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTaskLog {
    pub title: String,
    pub details: String,
    pub related_project_id: Option<DocId>,
}

impl NewTaskLog {
    pub fn new(title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
            related_project_id: None,
        }
    }

    pub fn for_project(mut self, project_id: impl Into<DocId>) -> Self {
        self.related_project_id = Some(project_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)
    }
}
