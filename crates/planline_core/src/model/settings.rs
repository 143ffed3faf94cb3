//! Per-tenant user settings singleton.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Accepted font scale percentages.
pub const FONT_SCALE_RANGE: RangeInclusive<u32> = 50..=200;
pub const DEFAULT_FONT_SCALE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub theme: Theme,
    /// Integer percent applied to the base font size.
    #[serde(default = "default_font_scale")]
    pub font_scale: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_scale: DEFAULT_FONT_SCALE,
        }
    }
}

fn default_font_scale() -> u32 {
    DEFAULT_FONT_SCALE
}

/// Merge-write input; `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub font_scale: Option<u32>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.font_scale {
            Some(scale) if !FONT_SCALE_RANGE.contains(&scale) => {
                Err(ValidationError::OutOfRange {
                    field: "fontScale",
                    value: i64::from(scale),
                    min: i64::from(*FONT_SCALE_RANGE.start()),
                    max: i64::from(*FONT_SCALE_RANGE.end()),
                })
            }
            _ => Ok(()),
        }
    }
}
