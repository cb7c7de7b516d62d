//! Named response stores and the fetch strategies that use them.
//!
//! This module provides:
//! - the `CacheStorage` seam over a persistent URL → response store
//! - a SQLite implementation that survives restarts
//! - cache-first (with background revalidation) and network-first strategies
//! - offline mode (a synthetic 503 when neither network nor cache can answer)

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, Strategy};
pub use storage::SqliteStorage;
pub use traits::{CacheSource, CacheStorage, Served};
