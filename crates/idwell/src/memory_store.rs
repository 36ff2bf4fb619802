use crate::OptimisticStore;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// An in-process, thread-safe [`OptimisticStore`].
///
/// Cloning is cheap and every clone shares the same underlying counter map,
/// so a store can be handed to a generator and still be inspected from a
/// test or another thread. Read snapshots are *not* shared: each handle
/// records its own last-read value per scope, so a compare-and-swap is
/// conditional on what *this* handle read, exactly as the
/// [`OptimisticStore`] contract requires. Two handles racing on one scope
/// behave like two processes racing on a shared store: the loser's write
/// fails.
///
/// A scope read for the first time is initialized to `"1"`, i.e. ids for a
/// fresh scope start at 1. A successful write consumes the handle's
/// snapshot, so another read is required before the next write can succeed.
///
/// This store makes no durability claims. It exists so the crate is usable
/// and testable without an external backing service.
///
/// # Example
///
/// ```
/// use idwell::{MemoryStore, OptimisticStore};
///
/// let store = MemoryStore::default();
/// assert_eq!(store.get_data("orders"), "1");
/// assert!(store.try_optimistic_write("orders", "101"));
/// assert_eq!(store.peek("orders"), Some("101".to_owned()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Current counter per scope, shared by every clone of this store.
    values: Arc<Mutex<HashMap<String, String>>>,
    /// Value each scope held when this handle last read it. Deliberately
    /// not behind the shared `Arc`: the snapshot belongs to the caller,
    /// not to the store.
    observed: Mutex<HashMap<String, String>>,
}

impl Clone for MemoryStore {
    /// Returns a handle over the same counters with no read snapshots of
    /// its own yet.
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            observed: Mutex::new(HashMap::new()),
        }
    }
}

impl MemoryStore {
    /// Creates an empty store. Equivalent to [`MemoryStore::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for `scope` without recording a read
    /// snapshot, or `None` if the scope has never been touched.
    pub fn peek(&self, scope: &str) -> Option<String> {
        self.values.lock().get(scope).cloned()
    }

    /// Unconditionally overwrites the record for `scope`.
    ///
    /// This bypasses the compare-and-swap discipline and also drops this
    /// handle's pending read snapshot. Intended for administrative resets
    /// and for tests that need to plant a specific (possibly corrupt)
    /// value.
    pub fn set_value(&self, scope: &str, value: &str) {
        let mut values = self.values.lock();
        values.insert(scope.to_owned(), value.to_owned());
        self.observed.lock().remove(scope);
    }
}

impl OptimisticStore for MemoryStore {
    fn get_data(&self, scope: &str) -> String {
        let mut values = self.values.lock();
        let value = values
            .entry(scope.to_owned())
            .or_insert_with(|| "1".to_owned())
            .clone();
        self.observed.lock().insert(scope.to_owned(), value.clone());
        value
    }

    fn try_optimistic_write(&self, scope: &str, value: &str) -> bool {
        let mut values = self.values.lock();
        let mut observed = self.observed.lock();
        // The comparison is against the snapshot this handle took at its
        // last read; a write with no preceding read always loses, and so
        // does a write whose snapshot another handle has since overwritten.
        let (Some(current), Some(snapshot)) = (values.get(scope), observed.get(scope)) else {
            return false;
        };
        if current != snapshot {
            return false;
        }
        values.insert(scope.to_owned(), value.to_owned());
        observed.remove(scope);
        true
    }
}
