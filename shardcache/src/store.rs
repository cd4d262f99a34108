use crate::listener::RemoveReason;
use crate::policy::{EvictCallback, EvictionPolicy, Lookup, PolicyConfig};
use crate::registry::PolicyBuilder;
use crate::task::notifier::{Notification, Notifier};

use core::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_utils::CachePadded;
use parking_lot::{Mutex, RwLock};

/// A helper function to hash a key using a `BuildHasher`.
#[inline]
pub(crate) fn hash_key<K: Hash + ?Sized, H: BuildHasher>(hasher: &H, key: &K) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

/// One keyspace partition: a policy instance behind a reader/writer lock.
///
/// Evictions reported by the policy are buffered in `pending` while the lock
/// is held and handed to the notifier only after it has been released.
pub(crate) struct Shard<K: Send, V: Send + Sync> {
  policy: RwLock<Box<dyn EvictionPolicy<K, V>>>,
  pending: Arc<Mutex<Vec<Notification<K, V>>>>,
  notifier: Option<Arc<Notifier<K, V>>>,
}

impl<K: Send, V: Send + Sync> fmt::Debug for Shard<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Shard")
      .field("len", &self.policy.read().len())
      .finish_non_exhaustive()
  }
}

impl<K, V> Shard<K, V>
where
  K: Send + 'static,
  V: Send + Sync + 'static,
{
  pub(crate) fn new(
    builder: &dyn PolicyBuilder<K, V>,
    config: PolicyConfig,
    notifier: Option<Arc<Notifier<K, V>>>,
  ) -> Self {
    let pending: Arc<Mutex<Vec<Notification<K, V>>>> = Arc::new(Mutex::new(Vec::new()));

    // Without a listener there is nobody to tell, so the buffer stays empty.
    let on_evict: EvictCallback<K, V> = if notifier.is_some() {
      let sink = pending.clone();
      Arc::new(move |key: K, value: Arc<V>, reason: RemoveReason| {
        sink.lock().push((key, value, reason))
      })
    } else {
      Arc::new(|_key: K, _value: Arc<V>, _reason: RemoveReason| {})
    };

    Self {
      policy: RwLock::new(builder.build(config, on_evict)),
      pending,
      notifier,
    }
  }

  /// Hands buffered notifications to the notifier. Must be called with the
  /// policy lock released.
  fn flush(&self) {
    let Some(notifier) = &self.notifier else {
      return;
    };
    let batch = std::mem::take(&mut *self.pending.lock());
    if !batch.is_empty() {
      notifier.dispatch(batch);
    }
  }

  pub(crate) fn insert(&self, key: K, value: Arc<V>) -> bool {
    let accepted = self.policy.write().insert(key, value);
    self.flush();
    accepted
  }

  /// Reads `key` and records the access. Takes the exclusive lock because a
  /// recency-ordered policy reorders on every hit.
  pub(crate) fn lookup(&self, key: &K) -> Lookup<V> {
    let result = self.policy.write().lookup(key);
    self.flush();
    result
  }

  pub(crate) fn peek(&self, key: &K) -> Lookup<V> {
    self.policy.read().peek(key)
  }

  pub(crate) fn contains(&self, key: &K) -> bool {
    self.policy.read().contains(key)
  }

  pub(crate) fn len(&self) -> usize {
    self.policy.read().len()
  }

  pub(crate) fn keys(&self) -> Vec<K> {
    self.policy.read().keys()
  }

  pub(crate) fn remove(&self, key: &K) -> bool {
    let removed = self.policy.write().remove(key);
    self.flush();
    removed
  }

  pub(crate) fn sweep(&self, now: Duration) -> usize {
    let removed = self.policy.write().sweep(now);
    self.flush();
    removed
  }

  pub(crate) fn clear(&self) {
    self.policy.write().clear();
    self.flush();
  }

  /// Returns the live value for `key` if there is one; otherwise stores
  /// `value`. Both happen under one exclusive acquisition.
  pub(crate) fn load_or_store(&self, key: K, value: Arc<V>) -> (Arc<V>, bool) {
    let result = {
      let mut policy = self.policy.write();
      match policy.peek(&key) {
        Lookup::Hit(current) => (current, true),
        Lookup::Stale(_) | Lookup::Miss => {
          policy.insert(key, value.clone());
          (value, false)
        }
      }
    };
    self.flush();
    result
  }

  /// Stores `update` if `key` has no live value or if `eq(current, expect)`
  /// holds. Otherwise the current value is returned untouched.
  pub(crate) fn compare_and_set<F>(&self, key: K, expect: &V, update: Arc<V>, eq: F) -> (Arc<V>, bool)
  where
    F: FnOnce(&V, &V) -> bool,
  {
    let result = {
      let mut policy = self.policy.write();
      let mismatch = match policy.peek(&key) {
        Lookup::Hit(current) => {
          if eq(&current, expect) {
            None
          } else {
            Some(current)
          }
        }
        Lookup::Stale(_) | Lookup::Miss => None,
      };

      match mismatch {
        Some(current) => (current, false),
        None => {
          policy.insert(key, update.clone());
          (update, true)
        }
      }
    };
    self.flush();
    result
  }
}

/// A cache store that is partitioned into a power-of-two number of
/// independently locked shards.
///
/// This design allows for high concurrency by ensuring that operations on
/// different keys are unlikely to contend for the same lock.
pub(crate) struct ShardedStore<K: Send, V: Send + Sync, H> {
  pub(crate) shards: Box<[CachePadded<Shard<K, V>>]>,
  pub(crate) hasher: H,
  mask: u64,
}

impl<K: Send, V: Send + Sync, H> fmt::Debug for ShardedStore<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShardedStore")
      .field("num_shards", &self.shards.len())
      .finish()
  }
}

impl<K, V, H> ShardedStore<K, V, H>
where
  K: Eq + Hash + Send + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher,
{
  /// Creates a store over already-built shards. The shard count must be a
  /// power of two; the builder validates this.
  pub(crate) fn new(shards: Vec<Shard<K, V>>, hasher: H) -> Self {
    debug_assert!(shards.len().is_power_of_two());
    let mask = (shards.len() as u64).wrapping_sub(1);
    Self {
      shards: shards.into_iter().map(CachePadded::new).collect(),
      hasher,
      mask,
    }
  }

  #[inline]
  pub(crate) fn get_shard_index(&self, key: &K) -> usize {
    (hash_key(&self.hasher, key) & self.mask) as usize
  }

  /// Returns the shard that owns `key`.
  #[inline]
  pub(crate) fn get_shard(&self, key: &K) -> &Shard<K, V> {
    // `CachePadded` derefs to the inner shard.
    &self.shards[self.get_shard_index(key)]
  }

  pub(crate) fn iter_shards(&self) -> impl Iterator<Item = &Shard<K, V>> {
    self.shards.iter().map(|padded| &**padded)
  }

  /// Runs one expiry pass over every shard in order.
  pub(crate) fn sweep(&self, now: Duration) -> usize {
    self.iter_shards().map(|shard| shard.sweep(now)).sum()
  }
}
