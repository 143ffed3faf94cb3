//! Failure taxonomy for store errors.
//!
//! # Invariants
//! - Classification is by structured code first.
//! - The textual "offline" hint is consulted only when the code is absent or
//!   `unknown`, so a coded failure is never reclassified by its message.

use crate::store::{StoreError, StoreErrorCode};
use std::fmt::{Display, Formatter};

const OFFLINE_HINT: &str = "offline";

/// Application-level category of a failed store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend refused access (rules/permissions). User-actionable.
    Blocked,
    /// The backend is unreachable. Expected while disconnected.
    Degraded,
    /// Anything else; kept for diagnostics.
    Unknown(StoreError),
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Degraded => "degraded",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(err) => write!(f, "unknown: {err}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Maps a raw store failure onto [`FailureKind`].
pub fn classify(err: &StoreError) -> FailureKind {
    match err.code {
        Some(StoreErrorCode::PermissionDenied) => FailureKind::Blocked,
        Some(StoreErrorCode::Unavailable | StoreErrorCode::DeadlineExceeded) => {
            FailureKind::Degraded
        }
        None | Some(StoreErrorCode::Unknown) if mentions_offline(&err.message) => {
            FailureKind::Degraded
        }
        _ => FailureKind::Unknown(err.clone()),
    }
}

/// Returns whether `err` only means "not reachable right now".
pub fn is_offline(err: &StoreError) -> bool {
    classify(err) == FailureKind::Degraded
}

fn mentions_offline(message: &str) -> bool {
    message.to_ascii_lowercase().contains(OFFLINE_HINT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_blocked() {
        let err = StoreError::permission_denied("Missing or insufficient permissions.");
        assert_eq!(classify(&err), FailureKind::Blocked);
    }

    #[test]
    fn unreachable_codes_are_degraded() {
        assert_eq!(
            classify(&StoreError::unavailable("backend down")),
            FailureKind::Degraded
        );
        assert_eq!(
            classify(&StoreError::new(StoreErrorCode::DeadlineExceeded, "slow")),
            FailureKind::Degraded
        );
    }

    #[test]
    fn offline_text_applies_only_without_a_specific_code() {
        let uncoded = StoreError::uncoded("Failed to get document because the client is Offline.");
        assert_eq!(classify(&uncoded), FailureKind::Degraded);

        let unknown_code = StoreError::new(StoreErrorCode::Unknown, "client is offline");
        assert_eq!(classify(&unknown_code), FailureKind::Degraded);

        let coded = StoreError::new(StoreErrorCode::FailedPrecondition, "offline index missing");
        assert_eq!(classify(&coded), FailureKind::Unknown(coded.clone()));

        let denied = StoreError::permission_denied("offline rules deny access");
        assert_eq!(classify(&denied), FailureKind::Blocked);
    }

    #[test]
    fn everything_else_is_unknown_and_keeps_the_raw_error() {
        let err = StoreError::internal("boom");
        match classify(&err) {
            FailureKind::Unknown(raw) => assert_eq!(raw, err),
            other => panic!("unexpected classification: {other}"),
        }
    }
}
