//! Phase and subphase entities.
//!
//! A phase belongs to a project and a subphase to a phase. Both carry a
//! client-chosen schedule (`startAt`..`endAt`, epoch milliseconds) and a
//! manual `orderIndex` that is unique within the parent.

use super::{now_ms, require_ordered, require_text, ValidationError};
use crate::store::DocId;
use serde::{Deserialize, Serialize};

/// Default span of a new phase when the caller gives no end date.
pub const DEFAULT_PHASE_SPAN_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: DocId,
    pub project_id: DocId,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    #[serde(default)]
    pub done: bool,
    pub order_index: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subphase {
    pub id: DocId,
    pub phase_id: DocId,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    #[serde(default)]
    pub done: bool,
    pub order_index: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Schedule and content shared by new phases and subphases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDraft {
    pub title: String,
    pub notes: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub done: bool,
    /// Defaults to the current number of siblings.
    pub order_index: Option<i64>,
}

impl StageDraft {
    /// Draft starting now and lasting [`DEFAULT_PHASE_SPAN_MS`].
    pub fn titled(title: impl Into<String>) -> Self {
        let start_at = now_ms();
        Self {
            title: title.into(),
            notes: None,
            start_at,
            end_at: start_at + DEFAULT_PHASE_SPAN_MS,
            done: false,
            order_index: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_ordered("startAt", self.start_at, "endAt", self.end_at)
    }
}

/// Input for `add_phase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhase {
    pub project_id: DocId,
    pub draft: StageDraft,
}

impl NewPhase {
    pub fn new(project_id: impl Into<DocId>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            draft: StageDraft::titled(title),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("projectId", &self.project_id)?;
        self.draft.validate()
    }
}

/// Input for `add_subphase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubphase {
    pub phase_id: DocId,
    pub draft: StageDraft,
}

impl NewSubphase {
    pub fn new(phase_id: impl Into<DocId>, title: impl Into<String>) -> Self {
        Self {
            phase_id: phase_id.into(),
            draft: StageDraft::titled(title),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("phaseId", &self.phase_id)?;
        self.draft.validate()
    }
}

/// Partial update for a phase or subphase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StagePatch {
    pub title: Option<String>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    pub done: Option<bool>,
    pub order_index: Option<i64>,
}

impl StagePatch {
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let (Some(start), Some(end)) = (self.start_at, self.end_at) {
            require_ordered("startAt", start, "endAt", end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_draft_spans_one_week() {
        let draft = StageDraft::titled("Discovery");
        assert_eq!(draft.end_at - draft.start_at, DEFAULT_PHASE_SPAN_MS);
        assert!(!draft.done);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn inverted_schedule_is_rejected() {
        let mut draft = StageDraft::titled("Build");
        draft.end_at = draft.start_at - 1;
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::InvertedRange { .. })
        ));

        let patch = StagePatch {
            start_at: Some(10),
            end_at: Some(5),
            ..StagePatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn phase_decodes_from_camel_case_document() {
        let phase: Phase = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "projectId": "proj",
            "ownerId": "demo",
            "title": "Kickoff",
            "startAt": 1,
            "endAt": 2,
            "done": true,
            "orderIndex": 0,
            "createdAt": 5,
            "updatedAt": 6
        }))
        .expect("phase should decode");
        assert_eq!(phase.project_id, "proj");
        assert!(phase.done);
        assert_eq!(phase.notes, None);
    }
}
