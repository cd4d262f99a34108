use crate::error::CloseError;
use crate::hasher::Fnv64a;
use crate::shared::CacheShared;
use crate::time;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A thread-safe, sharded cache.
///
/// `Cache` is a handle: cloning it is cheap and every clone operates on the
/// same shards. Background threads stop when [`close`](Cache::close) is called
/// or when the last handle is dropped.
pub struct Cache<K: Send, V: Send + Sync, H = Fnv64a> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K: Send, V: Send + Sync, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<K: Send, V: Send + Sync, H> fmt::Debug for Cache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache").field("shared", &self.shared).finish()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher,
{
  /// Inserts or overwrites `key`. Overwriting refreshes the value and the
  /// expiry and counts as a use.
  ///
  /// Returns whether the policy accepted the entry. It is `true` for the
  /// built-in policies, even when the write pushed another entry out.
  pub fn set(&self, key: K, value: V) -> bool {
    self.shared.store.get_shard(&key).insert(key, Arc::new(value))
  }

  /// Retrieves a value from the cache and marks it as recently used.
  ///
  /// Returns `None` if the key is absent or its entry has expired. An expired
  /// entry stays resident until the next sweep.
  pub fn get(&self, key: &K) -> Option<Arc<V>> {
    self.shared.store.get_shard(key).lookup(key).hit()
  }

  /// Like [`get`](Cache::get), but leaves the eviction order untouched and
  /// only takes the shard's shared lock.
  pub fn peek(&self, key: &K) -> Option<Arc<V>> {
    self.shared.store.get_shard(key).peek(key).hit()
  }

  /// Removes `key`, notifying the listener with [`RemoveReason::Deleted`].
  ///
  /// [`RemoveReason::Deleted`]: crate::RemoveReason::Deleted
  pub fn delete(&self, key: &K) -> bool {
    self.shared.store.get_shard(key).remove(key)
  }

  /// Returns `true` if `key` holds an unexpired entry.
  pub fn contains(&self, key: &K) -> bool {
    self.shared.store.get_shard(key).contains(key)
  }

  /// Number of resident entries across all shards, expired ones included.
  ///
  /// Shards are visited one after another, so under concurrent writes the
  /// total is not a point-in-time snapshot.
  pub fn count(&self) -> usize {
    self.shared.store.iter_shards().map(|shard| shard.len()).sum()
  }

  /// Returns the existing live value and `true`, or stores `value` and
  /// returns it with `false`. The check and the store are atomic per key.
  pub fn load_or_store(&self, key: K, value: V) -> (Arc<V>, bool) {
    self.shared.store.get_shard(&key).load_or_store(key, Arc::new(value))
  }

  /// Stores `update` when `key` is absent or when `eq(current, expect)`
  /// holds, returning `(update, true)`. Otherwise returns the current value
  /// and `false` without touching the entry.
  ///
  /// `eq` runs while the key's shard is exclusively locked. It must not call
  /// back into this cache: touching a key on the same shard deadlocks.
  pub fn compare_and_set<F>(&self, key: K, expect: &V, update: V, eq: F) -> (Arc<V>, bool)
  where
    F: FnOnce(&V, &V) -> bool,
  {
    self
      .shared
      .store
      .get_shard(&key)
      .compare_and_set(key, expect, Arc::new(update), eq)
  }

  /// Snapshot of all resident keys, shard by shard, each shard ordered from
  /// the next eviction candidate to the most recently used.
  pub fn keys(&self) -> Vec<K> {
    self.shared.store.iter_shards().flat_map(|shard| shard.keys()).collect()
  }

  /// Removes every entry, notifying the listener with
  /// [`RemoveReason::Clear`](crate::RemoveReason::Clear) for each.
  pub fn clear(&self) {
    for shard in self.shared.store.iter_shards() {
      shard.clear();
    }
  }

  /// Runs one expiry sweep over every shard now and returns how many entries
  /// it removed.
  pub fn sweep_expired(&self) -> usize {
    self.shared.store.sweep(time::now_duration())
  }
}

impl<K: Send, V: Send + Sync, H> Cache<K, V, H> {
  /// Stops the background expiry sweep.
  ///
  /// The cache stays usable afterwards and removals are still reported to
  /// the eviction listener. The notification thread exits once the last
  /// handle is dropped. Calling `close` again returns `Ok(())`.
  pub fn close(&self) -> Result<(), CloseError> {
    self.shared.close()
  }

  /// Returns `true` once [`close`](Cache::close) has been called.
  pub fn is_closed(&self) -> bool {
    self.shared.is_closed()
  }

  /// Number of shards.
  pub fn shard_count(&self) -> usize {
    self.shared.store.shards.len()
  }
}
