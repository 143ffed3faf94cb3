//! Per-tenant settings singleton at `userSettings/{tenant}`.
//!
//! # Invariants
//! - Exactly one document per tenant; its id is the tenant id.
//! - `update_settings` merges: unspecified fields keep their stored value.
//! - A missing document and a failed read resolve through the same
//!   [`MissingSettings`] policy.

use super::{decode_doc, USER_SETTINGS};
use crate::config::MissingSettings;
use crate::model::settings::{SettingsPatch, Theme, UserSettings};
use crate::model::TenantId;
use crate::resilience::Resilient;
use crate::store::{DocId, DocumentPath, SetOptions, WriteData};
use log::warn;

#[derive(Clone)]
pub struct SettingsRepository {
    guard: Resilient,
    tenant: TenantId,
    missing: MissingSettings,
}

impl SettingsRepository {
    pub fn new(guard: Resilient, tenant: TenantId, missing: MissingSettings) -> Self {
        Self {
            guard,
            tenant,
            missing,
        }
    }

    fn path(&self) -> DocumentPath {
        DocumentPath::new(USER_SETTINGS, self.tenant.as_str())
    }

    fn absent(&self) -> Option<UserSettings> {
        match self.missing {
            MissingSettings::UseDefaults => Some(UserSettings::default()),
            MissingSettings::ReportAbsent => None,
        }
    }

    /// Stored settings, else the policy outcome.
    pub async fn get_settings(&self) -> Option<UserSettings> {
        let path = self.path();
        let stored = self
            .guard
            .or_fallback("settings.get", None, |store| async move {
                let doc = store.get_doc(&path).await?;
                Ok(doc.and_then(|doc| decode_doc::<UserSettings>(USER_SETTINGS, doc)))
            })
            .await;
        stored.or_else(|| self.absent())
    }

    /// Merge-writes the given fields, creating the document when missing.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Option<DocId> {
        if let Err(err) = patch.validate() {
            warn!("event=settings.update module=repo status=rejected error={}", err);
            return None;
        }
        let path = self.path();
        let data = WriteData::new()
            .set_opt("theme", patch.theme.map(Theme::as_str))
            .set_opt("fontScale", patch.font_scale);
        self.guard
            .or_none("settings.update", |store| async move {
                store.set_doc(&path, data, SetOptions::merge()).await?;
                Ok(path.id)
            })
            .await
    }
}
