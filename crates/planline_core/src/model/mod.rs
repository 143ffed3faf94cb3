//! Typed entities stored in the document store.
//!
//! # Responsibility
//! - Define the six entity shapes and their creation/patch inputs.
//! - Validate caller input before any write reaches the store.
//!
//! # Invariants
//! - Documents are serialized with camelCase field names.
//! - `createdAt`/`updatedAt` are never produced by these types; the store
//!   assigns them.
//! - Every entity except settings carries the owning tenant id.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod phase;
pub mod project;
pub mod reminder;
pub mod settings;
pub mod task_log;

/// Identity scoping every query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    InvertedRange {
        start_field: &'static str,
        end_field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::InvertedRange {
                start_field,
                end_field,
            } => write!(f, "`{end_field}` must not be earlier than `{start_field}`"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` = {value} is outside {min}..={max}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

pub(crate) fn require_ordered(
    start_field: &'static str,
    start: i64,
    end_field: &'static str,
    end: i64,
) -> Result<(), ValidationError> {
    if end < start {
        Err(ValidationError::InvertedRange {
            start_field,
            end_field,
        })
    } else {
        Ok(())
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
