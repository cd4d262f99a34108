//! The eviction-policy contract and the policies shipped with the cache.
//!
//! A policy owns every entry of one shard: the recency (or insertion) order,
//! the key index and the expiry stamps. It is never shared between shards and
//! is only ever touched while its shard's lock is held, so implementations are
//! plain single-threaded data structures.

pub mod fifo;
pub mod lru;

mod entry_list;

pub use entry_list::EntryList;

use crate::listener::RemoveReason;

use std::sync::Arc;
use std::time::Duration;

/// The callback a policy invokes for every entry it drops.
///
/// The cache hands each policy a callback that only buffers the notification;
/// delivery to the user's listener happens later, outside the shard lock.
pub type EvictCallback<K, V> = Arc<dyn Fn(K, Arc<V>, RemoveReason) + Send + Sync>;

/// How an entry's expiry is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpirationMode {
  /// The deadline is fixed when the entry is written and only a new write
  /// moves it.
  #[default]
  AfterWrite,
  /// A read hit through `lookup` also pushes the deadline forward.
  AfterAccess,
}

/// The parameters a strategy builder receives for one shard's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
  /// Maximum number of resident entries. Zero means unbounded.
  pub capacity: usize,
  /// Time-to-live applied on write. Zero means entries never expire.
  pub ttl: Duration,
  pub expiration_mode: ExpirationMode,
}

/// The outcome of reading a key from a policy.
#[derive(Debug)]
pub enum Lookup<V> {
  /// The key is resident and live.
  Hit(Arc<V>),
  /// The key is resident but its deadline has passed. It stays in place until
  /// a sweep removes it.
  Stale(Arc<V>),
  /// The key is not resident.
  Miss,
}

impl<V> Lookup<V> {
  #[inline]
  pub fn is_hit(&self) -> bool {
    matches!(self, Lookup::Hit(_))
  }

  /// Returns the value only for a live hit.
  #[inline]
  pub fn hit(self) -> Option<Arc<V>> {
    match self {
      Lookup::Hit(value) => Some(value),
      _ => None,
    }
  }
}

/// A pluggable eviction policy.
///
/// Mutating methods take `&mut self`; the owning shard guarantees exclusive
/// access for them and shared access for the rest.
pub trait EvictionPolicy<K, V>: Send + Sync {
  /// Inserts or overwrites `key`. Overwriting refreshes the value and the
  /// expiry. If the insert pushes the policy over capacity, one entry is
  /// evicted with [`RemoveReason::NoSpace`].
  ///
  /// Returns `true` when the write was accepted. It does not signal eviction.
  fn insert(&mut self, key: K, value: Arc<V>) -> bool;

  /// Reads `key`, updating whatever access bookkeeping the policy keeps.
  fn lookup(&mut self, key: &K) -> Lookup<V>;

  /// Reads `key` without touching any access bookkeeping.
  fn peek(&self, key: &K) -> Lookup<V>;

  /// Returns `true` if `key` is resident and live.
  fn contains(&self, key: &K) -> bool;

  /// Removes `key`, reporting it with [`RemoveReason::Deleted`].
  fn remove(&mut self, key: &K) -> bool;

  /// Evicts the entry the policy considers least valuable, if any.
  fn remove_oldest(&mut self);

  /// All resident keys, oldest first.
  fn keys(&self) -> Vec<K>;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drops every entry, reporting each with [`RemoveReason::Clear`].
  fn clear(&mut self);

  /// Removes every entry whose deadline is at or before `now`, reporting each
  /// with [`RemoveReason::Expired`]. Returns how many were removed.
  fn sweep(&mut self, now: Duration) -> usize;
}
