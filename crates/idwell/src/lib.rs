mod error;
mod generator;
mod memory_store;
mod registry;
mod store;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::memory_store::*;
pub use crate::store::*;
