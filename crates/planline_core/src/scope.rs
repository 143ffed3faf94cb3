//! Stale-response guard for view result handlers.
//!
//! A view takes a [`ScopeTicket`] before starting a request and checks it
//! before applying the result. Leaving the view (or reloading it)
//! invalidates every outstanding ticket; in-flight operations still finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    generation: Arc<AtomicU64>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> ScopeTicket {
        ScopeTicket {
            scope: Arc::clone(&self.generation),
            issued: self.generation.load(Ordering::Acquire),
        }
    }

    /// Marks all tickets issued so far as stale.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct ScopeTicket {
    scope: Arc<AtomicU64>,
    issued: u64,
}

impl ScopeTicket {
    pub fn is_current(&self) -> bool {
        self.scope.load(Ordering::Acquire) == self.issued
    }

    /// Passes `value` through only while the ticket is current.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        self.is_current().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::ViewScope;

    #[test]
    fn invalidation_stales_outstanding_tickets_only() {
        let scope = ViewScope::new();
        let before = scope.ticket();
        assert!(before.is_current());

        scope.invalidate();
        assert!(!before.is_current());
        assert_eq!(before.accept(3), None);

        let after = scope.ticket();
        assert_eq!(after.accept("fresh"), Some("fresh"));
    }
}
