use crate::{
    Error, OptimisticStore, Result,
    registry::{Batch, ScopeRegistry},
};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default number of ids reserved per store round trip.
pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Default bound on compare-and-swap attempts per refill.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 25;

/// A generator of unique, monotonically increasing 64-bit ids, partitioned
/// by named scope.
///
/// Ids are reserved from the backing store in batches and served from
/// memory, so most calls never touch the store. When a scope's batch is
/// exhausted the generator reserves the next one with a bounded
/// optimistic-concurrency loop: read the store's counter, claim a range,
/// and commit it with a compare-and-swap write. The value written is always
/// one past the last id this process claims, so a concurrent process —
/// sharing nothing with this one but the store — starts its own batch
/// strictly after this one's range.
///
/// ## Features
///
/// - ✅ Thread-safe: all methods take `&self`; share it behind an `Arc`
/// - ✅ Scopes are fully independent: allocation on one scope never blocks
///   another
/// - ✅ Safe against concurrent processes, via the store's compare-and-swap
///
/// ## Trade-off
///
/// Larger batches mean fewer store round trips but more unissued ids wasted
/// when a process restarts. Ids are unique and increasing, not gap-free
/// across restarts.
///
/// # Example
///
/// ```
/// use idwell::{BatchIdGenerator, MemoryStore};
///
/// let generator = BatchIdGenerator::new(MemoryStore::default());
/// assert_eq!(generator.next_id("orders").unwrap(), 1);
/// assert_eq!(generator.next_id("orders").unwrap(), 2);
/// assert_eq!(generator.next_id("invoices").unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct BatchIdGenerator<S>
where
    S: OptimisticStore,
{
    store: S,
    scopes: ScopeRegistry,
    batch_size: i64,
    max_write_attempts: u32,
}

impl<S> BatchIdGenerator<S>
where
    S: OptimisticStore,
{
    /// Creates a generator over `store` with the default configuration
    /// ([`DEFAULT_BATCH_SIZE`], [`DEFAULT_MAX_WRITE_ATTEMPTS`]).
    pub fn new(store: S) -> Self {
        Self {
            store,
            scopes: ScopeRegistry::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Sets the number of ids reserved per store round trip.
    ///
    /// Rejects values below 1 with [`Error::Configuration`] at assignment
    /// time.
    ///
    /// # Example
    ///
    /// ```
    /// use idwell::{BatchIdGenerator, MemoryStore};
    ///
    /// let generator = BatchIdGenerator::new(MemoryStore::default())
    ///     .with_batch_size(1000)
    ///     .unwrap();
    /// assert_eq!(generator.batch_size(), 1000);
    /// assert!(
    ///     BatchIdGenerator::new(MemoryStore::default())
    ///         .with_batch_size(0)
    ///         .is_err()
    /// );
    /// ```
    pub fn with_batch_size(mut self, batch_size: i64) -> Result<Self> {
        if batch_size < 1 {
            return Err(Error::Configuration {
                reason: format!("batch_size must be at least 1, got {batch_size}"),
            });
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Sets the bound on compare-and-swap attempts per refill.
    ///
    /// Rejects values below 1 with [`Error::Configuration`] at assignment
    /// time, not at first use.
    pub fn with_max_write_attempts(mut self, max_write_attempts: u32) -> Result<Self> {
        if max_write_attempts < 1 {
            return Err(Error::Configuration {
                reason: format!(
                    "max_write_attempts must be at least 1, got {max_write_attempts}"
                ),
            });
        }
        self.max_write_attempts = max_write_attempts;
        Ok(self)
    }

    /// Number of ids reserved per store round trip.
    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    /// Bound on compare-and-swap attempts per refill.
    pub fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
    }

    /// Issues the next id for `scope`.
    ///
    /// Served from the scope's in-memory batch when one is available; when
    /// the batch is exhausted (including the very first call for a scope),
    /// the next batch is reserved from the store first. The scope's lock is
    /// held across the whole check-refill-increment sequence, so same-scope
    /// callers in this process serialize while other scopes proceed
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::CorruptData`] if the store's value does not parse as an
    ///   `i64`. No write is attempted.
    /// - [`Error::ContentionExceeded`] if every compare-and-swap attempt
    ///   lost the race against another writer.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self, scope: &str) -> Result<i64> {
        let state = self.scopes.get_or_create(scope);
        let mut batch = state.lock();

        if batch.is_exhausted() {
            self.reserve_batch(scope, &mut batch, None)?;
        }

        batch.last_id += 1;
        Ok(batch.last_id)
    }

    /// Returns the most recently issued id for `scope`.
    ///
    /// If this process has issued an id for the scope (in-memory `last_id`
    /// is nonzero), it is returned without touching the store. Otherwise
    /// the store's raw counter is returned as-is.
    ///
    /// Note the asymmetry before first allocation: the store's counter is
    /// the *next* id to allocate, and this method does not apply the `-1`
    /// adjustment the refill path applies. On a scope this process has
    /// never allocated from, `last_id` therefore reports the id the next
    /// [`Self::next_id`] call will return, not a previously issued one.
    /// This mirrors the store contract's observable state and is preserved
    /// as documented behavior.
    ///
    /// # Errors
    ///
    /// - [`Error::CorruptData`] if the store's value does not parse as an
    ///   `i64`.
    pub fn last_id(&self, scope: &str) -> Result<i64> {
        let state = self.scopes.get_or_create(scope);
        let last_id = state.lock().last_id;
        if last_id != 0 {
            return Ok(last_id);
        }

        // Never synchronized with the store; report the store's view
        // without mutating in-memory state.
        self.read_counter(scope)
    }

    /// Forcibly rebases `scope` so the next issued id is `seed`.
    ///
    /// Runs under the same bounded compare-and-swap discipline as a refill.
    /// Seeding may never rewind below ids already claimed by any process:
    /// if `seed` is less than the store's current next id the call fails
    /// with [`Error::InvalidSeed`] immediately, with no retry and no store
    /// mutation.
    ///
    /// # Example
    ///
    /// ```
    /// use idwell::{BatchIdGenerator, MemoryStore};
    ///
    /// let generator = BatchIdGenerator::new(MemoryStore::default());
    /// generator.set_seed("orders", 500).unwrap();
    /// assert_eq!(generator.next_id("orders").unwrap(), 500);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSeed`] if `seed` is below the store's current next
    ///   id.
    /// - [`Error::CorruptData`] if the store's value does not parse as an
    ///   `i64`.
    /// - [`Error::ContentionExceeded`] if every compare-and-swap attempt
    ///   lost the race.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn set_seed(&self, scope: &str, seed: i64) -> Result<()> {
        let state = self.scopes.get_or_create(scope);
        let mut batch = state.lock();
        self.reserve_batch(scope, &mut batch, Some(seed))
    }

    /// Reserves the next batch for `scope`, retrying lost compare-and-swap
    /// races up to `max_write_attempts` times.
    ///
    /// With `seed: Some(_)` the batch starts at the seed instead of the
    /// store's counter (the seed-setter path); the seed is re-validated
    /// against the store on every attempt. Speculative bounds are committed
    /// into `batch` only after the store write succeeds, so a lost race or
    /// an exhausted loop never leaves the scope holding an unreserved
    /// range. A batch whose bounds would overflow `i64` fails immediately
    /// with [`Error::Configuration`], with no retry and no store write.
    fn reserve_batch(&self, scope: &str, batch: &mut Batch, seed: Option<i64>) -> Result<()> {
        for _ in 0..self.max_write_attempts {
            let next_id = self.read_counter(scope)?;

            let first = match seed {
                Some(seed) if seed < next_id => {
                    return Err(Error::InvalidSeed {
                        scope: scope.to_owned(),
                        seed,
                        next_id,
                    });
                }
                Some(seed) => seed,
                None => next_id,
            };

            // The committed store value is highest_available + 1, so the
            // whole range [first - 1, highest + 1] must be representable.
            let bounds = first.checked_sub(1).and_then(|last| {
                let highest = last.checked_add(self.batch_size)?;
                let next_batch = highest.checked_add(1)?;
                Some((last, highest, next_batch))
            });
            let Some((last_id, highest_available, first_id_of_next_batch)) = bounds else {
                return Err(Error::Configuration {
                    reason: format!(
                        "reserving {} ids for scope '{scope}' starting at {first} would \
                         overflow the 64-bit id space",
                        self.batch_size
                    ),
                });
            };

            if self
                .store
                .try_optimistic_write(scope, &first_id_of_next_batch.to_string())
            {
                batch.last_id = last_id;
                batch.highest_available = highest_available;
                return Ok(());
            }
        }

        Err(Error::ContentionExceeded {
            scope: scope.to_owned(),
            attempts: self.max_write_attempts,
        })
    }

    fn read_counter(&self, scope: &str) -> Result<i64> {
        let raw = self.store.get_data(scope);
        raw.parse::<i64>().map_err(|_| Error::CorruptData {
            scope: scope.to_owned(),
            raw,
        })
    }
}
