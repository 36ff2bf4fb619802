//! Error types for scoped id generation.
//!
//! This module defines the central `Error` enum, which captures every failure
//! the generator can surface to a caller. None of these are retried
//! internally beyond the documented compare-and-swap loop, and none are
//! silently swallowed.
//!
//! ## Error Cases
//! - `CorruptData`: the store returned a value that is not a 64-bit integer.
//! - `ContentionExceeded`: every compare-and-swap attempt lost the race.
//! - `InvalidSeed`: a seed would rewind the counter below ids already
//!   claimed.
//! - `Configuration`: a configuration value was rejected at assignment
//!   time, or a reserved batch would overflow the 64-bit id space.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the id generator.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The store's record for a scope could not be parsed as an `i64`.
    ///
    /// This is a data integrity failure, not contention, and is never
    /// retried. `raw` is the offending stored value, verbatim.
    #[error("id counter for scope '{scope}' is corrupt: stored value {raw:?} does not parse as a 64-bit integer")]
    CorruptData { scope: String, raw: String },

    /// Every compare-and-swap attempt lost the race against another writer.
    #[error(
        "failed to update the store for scope '{scope}' after {attempts} attempts; \
         this likely means too much contention against the store. Consider a larger \
         batch size to reduce store round trips"
    )]
    ContentionExceeded { scope: String, attempts: u32 },

    /// A seed may never rewind a scope below ids already claimed by any
    /// process.
    #[error("seed {seed} for scope '{scope}' is less than the next available id {next_id}")]
    InvalidSeed {
        scope: String,
        seed: i64,
        next_id: i64,
    },

    /// A configuration value was rejected (raised when the value is
    /// assigned, not when it is first used), or the configured batch size
    /// cannot be applied because the reserved range would overflow the
    /// 64-bit id space.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },
}
