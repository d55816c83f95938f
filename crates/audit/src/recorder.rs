use std::sync::RwLock;

use crate::entry::AuditEntry;

/// Append-only audit sink.
///
/// Implementations must preserve append order. `record` is infallible by
/// contract: it runs strictly after a successful mutation, and the mutation
/// must not be rolled back because the trail hiccuped.
pub trait AuditTrail: Send + Sync {
    fn record(&self, entry: AuditEntry);

    /// Most recent entries, newest first.
    fn recent(&self, limit: usize) -> Vec<AuditEntry>;
}

/// In-memory append-only trail.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditTrail for InMemoryAuditTrail {
    fn record(&self, entry: AuditEntry) {
        tracing::debug!(actor = %entry.actor, action = %entry.action, "audit");
        if let Ok(mut entries) = self.entries.write() {
            entries.push(entry);
        }
    }

    fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        match self.entries.read() {
            Ok(entries) => entries.iter().rev().take(limit).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use adminkit_core::UserId;

    use crate::entry::AuditTarget;

    use super::*;

    #[test]
    fn recent_returns_newest_first() {
        let trail = InMemoryAuditTrail::new();
        let actor = UserId::new();
        let target = UserId::new();

        trail.record(AuditEntry::new(actor, "Blocked user", AuditTarget::User(target)));
        trail.record(AuditEntry::new(actor, "Unblocked user", AuditTarget::User(target)));

        let recent = trail.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "Unblocked user");
        assert_eq!(recent[1].action, "Blocked user");
    }

    #[test]
    fn recent_respects_limit() {
        let trail = InMemoryAuditTrail::new();
        let actor = UserId::new();
        for _ in 0..5 {
            trail.record(AuditEntry::new(actor, "Toggled active", AuditTarget::User(actor)));
        }
        assert_eq!(trail.recent(3).len(), 3);
        assert_eq!(trail.len(), 5);
    }
}
