use parking_lot::{Mutex, MutexGuard, RwLock};
use std::{collections::HashMap, sync::Arc};

/// Mutable allocation state for one scope, guarded by that scope's mutex.
///
/// `last_id == 0` is the sentinel for "never issued and not yet synchronized
/// with the store"; the exhaustion predicate deliberately covers that
/// all-zero initial state.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    pub last_id: i64,
    pub highest_available: i64,
}

impl Batch {
    /// True when every reserved id has been handed out (or nothing has been
    /// reserved yet) and a refill is required before the next issue.
    pub fn is_exhausted(&self) -> bool {
        self.last_id == self.highest_available
    }
}

/// Per-scope state: a batch behind its own mutex.
///
/// The mutex is held across the whole exhaustion-check → refill → increment
/// sequence, including any store round trip a refill performs, so at most
/// one refill is in flight per scope at any instant.
#[derive(Debug, Default)]
pub(crate) struct ScopeState {
    batch: Mutex<Batch>,
}

impl ScopeState {
    pub fn lock(&self) -> MutexGuard<'_, Batch> {
        self.batch.lock()
    }
}

/// Get-or-create mapping from scope name to [`ScopeState`].
///
/// Entries are created lazily on first reference and never removed; the
/// returned `Arc` is pointer-stable across calls so that locking it is
/// meaningful. Lookups of existing scopes take only the shared lock —
/// unrelated scopes must never serialize against each other here, and the
/// registry lock is never held across store I/O.
#[derive(Debug, Default)]
pub(crate) struct ScopeRegistry {
    scopes: RwLock<HashMap<String, Arc<ScopeState>>>,
}

impl ScopeRegistry {
    pub fn get_or_create(&self, scope: &str) -> Arc<ScopeState> {
        if let Some(state) = self.scopes.read().get(scope) {
            return Arc::clone(state);
        }

        // Re-check under the write lock; another thread may have inserted
        // between the read and the upgrade.
        let mut scopes = self.scopes.write();
        Arc::clone(scopes.entry(scope.to_owned()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_scope_returns_same_state() {
        let registry = ScopeRegistry::default();
        let a = registry.get_or_create("orders");
        let b = registry.get_or_create("orders");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_scopes_get_distinct_state() {
        let registry = ScopeRegistry::default();
        let a = registry.get_or_create("orders");
        let b = registry.get_or_create("invoices");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn fresh_state_is_exhausted() {
        let registry = ScopeRegistry::default();
        let state = registry.get_or_create("orders");
        let batch = state.lock();
        assert_eq!(batch.last_id, 0);
        assert_eq!(batch.highest_available, 0);
        assert!(batch.is_exhausted());
    }

    #[test]
    fn concurrent_get_or_create_converges() {
        use std::thread::scope;

        let registry = ScopeRegistry::default();
        let states: Vec<_> = scope(|s| {
            (0..8)
                .map(|_| s.spawn(|| registry.get_or_create("orders")))
                .collect::<Vec<_>>()
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect()
        });

        for state in &states[1..] {
            assert!(Arc::ptr_eq(&states[0], state));
        }
    }
}
