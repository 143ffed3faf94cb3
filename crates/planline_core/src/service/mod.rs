//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Surface an explicit error only for user-initiated writes that had no
//!   effect; everything else stays value-or-fallback.

use crate::model::reminder::ReminderStatus;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod project_service;
pub mod reminder_service;

/// Failure of a user-initiated action that the UI must alert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The repository returned its "no effect" fallback.
    WriteNotApplied { action: &'static str },
    /// The requested reminder status change is outside the lifecycle.
    InvalidTransition {
        from: ReminderStatus,
        to: ReminderStatus,
    },
}

impl ServiceError {
    /// Text suitable for an alert dialog.
    pub fn user_message(&self) -> String {
        match self {
            Self::WriteNotApplied { action } => format!(
                "Could not {action}. Check your connection or backend access and try again."
            ),
            Self::InvalidTransition { from, to } => format!(
                "A {} reminder cannot be marked {}.",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteNotApplied { action } => write!(f, "write not applied: {action}"),
            Self::InvalidTransition { from, to } => write!(
                f,
                "invalid reminder transition: {} -> {}",
                from.as_str(),
                to.as_str()
            ),
        }
    }
}

impl Error for ServiceError {}

pub type ServiceResult<T> = Result<T, ServiceError>;
