/// A shared counter store with optimistic (compare-and-swap) writes.
///
/// This abstraction is the generator's only view of the outside world. An
/// implementation might be backed by a blob store, a database row, or plain
/// process memory in tests — the generator only requires that reads return
/// the current textual counter for a scope and that writes are conditional
/// on the value not having moved since this caller last read it.
///
/// The stored record is opaque to the generator except that it must parse as
/// a 64-bit integer; a value that does not is reported as
/// [`Error::CorruptData`](crate::Error::CorruptData).
///
/// # Example
///
/// ```
/// use idwell::OptimisticStore;
///
/// struct FixedStore;
/// impl OptimisticStore for FixedStore {
///     fn get_data(&self, _scope: &str) -> String {
///         "1".to_owned()
///     }
///     fn try_optimistic_write(&self, _scope: &str, _value: &str) -> bool {
///         true
///     }
/// }
///
/// let store = FixedStore;
/// assert_eq!(store.get_data("orders"), "1");
/// ```
pub trait OptimisticStore {
    /// Returns the current textual value of the next-available-id counter
    /// for `scope`.
    ///
    /// If the scope has no prior record, the implementation decides the
    /// initialization policy (the generator treats whatever comes back as
    /// the first id it may hand out).
    fn get_data(&self, scope: &str) -> String;

    /// Atomically replaces the stored value for `scope` with `value`, but
    /// only if the stored value has not changed since it was last read by
    /// this caller.
    ///
    /// Returns `true` on success and `false` if the comparison failed
    /// (another writer won the race). A failed write must never partially
    /// apply.
    fn try_optimistic_write(&self, scope: &str, value: &str) -> bool;
}
