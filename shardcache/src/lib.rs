//! A sharded, thread-safe, in-process key/value cache.
//!
//! # Features
//! - **Sharded locking**: keys are spread over a power-of-two number of shards,
//!   each guarded by its own reader/writer lock.
//! - **Pluggable eviction**: every shard runs its own [`EvictionPolicy`]
//!   instance, chosen by name from a [`StrategyRegistry`]. LRU and FIFO ship
//!   with the crate.
//! - **Time-to-live**: entries can expire a fixed time after their last write,
//!   or after their last read. A background thread sweeps expired entries out.
//! - **Atomic composites**: [`Cache::load_or_store`] and
//!   [`Cache::compare_and_set`] run under a single shard lock.
//! - **Eviction notifications**: an [`EvictionListener`] is called on a
//!   dedicated thread, never while a shard lock is held. A panicking listener
//!   is logged and does not take the cache down.
//!
//! ```
//! use fibre_shardcache::CacheBuilder;
//! use std::time::Duration;
//!
//! let cache = CacheBuilder::<String, u64>::new()
//!   .shards(16)
//!   .expiration(Duration::from_secs(60))
//!   .build()
//!   .unwrap();
//!
//! cache.set("answer".to_string(), 42);
//! assert_eq!(cache.get(&"answer".to_string()).as_deref(), Some(&42));
//! cache.close().unwrap();
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod handles;
pub mod hasher;
pub mod listener;
pub mod policy;
pub mod registry;
pub mod time;

// Internal, crate-only modules
mod shared;
mod store;
mod task;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use error::{BuildError, CloseError};
pub use handles::Cache;
pub use hasher::Fnv64a;
pub use listener::{EvictionListener, RemoveReason};
pub use policy::{EvictCallback, EvictionPolicy, ExpirationMode, Lookup, PolicyConfig};
pub use registry::{PolicyBuilder, StrategyRegistry};
