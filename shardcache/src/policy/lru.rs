use super::{EntryList, EvictCallback, EvictionPolicy, ExpirationMode, Lookup, PolicyConfig};
use crate::listener::RemoveReason;
use crate::policy::entry_list::Node;
use crate::time;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// The name the LRU strategy is registered under.
pub const NAME: &str = "LRU";

/// An eviction policy that evicts the least recently used entry.
///
/// Every write and every `lookup` hit moves the entry to the front of the
/// recency list; capacity eviction takes from the back.
pub struct LruPolicy<K, V> {
  list: EntryList<K, V>,
  capacity: usize,
  ttl: Duration,
  expiration_mode: ExpirationMode,
  on_evict: EvictCallback<K, V>,
}

impl<K, V> fmt::Debug for LruPolicy<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LruPolicy")
      .field("capacity", &self.capacity)
      .field("ttl", &self.ttl)
      .field("expiration_mode", &self.expiration_mode)
      .finish_non_exhaustive()
  }
}

impl<K: Eq + Hash + Clone, V> LruPolicy<K, V> {
  pub fn new(config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Self {
    Self {
      list: EntryList::with_capacity(config.capacity),
      capacity: config.capacity,
      ttl: config.ttl,
      expiration_mode: config.expiration_mode,
      on_evict,
    }
  }

  #[inline]
  fn expires_at(&self, now: Duration) -> Option<Duration> {
    time::expiry_from(now, self.ttl)
  }

  #[inline]
  fn report(&self, node: Node<K, V>, reason: RemoveReason) {
    (self.on_evict)(node.key, node.value, reason);
  }

  fn read(&self, key: &K, now: Duration) -> Lookup<V> {
    match self.list.get(key) {
      None => Lookup::Miss,
      Some(node) if node.is_expired(now) => Lookup::Stale(node.value.clone()),
      Some(node) => Lookup::Hit(node.value.clone()),
    }
  }
}

impl<K, V> EvictionPolicy<K, V> for LruPolicy<K, V>
where
  K: Eq + Hash + Clone + Send + Sync,
  V: Send + Sync,
{
  fn insert(&mut self, key: K, value: Arc<V>) -> bool {
    let expires_at = self.expires_at(time::now_duration());
    let replaced = self.list.push_front(key, value, expires_at);

    if replaced.is_none() && self.capacity != 0 && self.list.len() > self.capacity {
      self.remove_oldest();
    }
    true
  }

  fn lookup(&mut self, key: &K) -> Lookup<V> {
    let now = time::now_duration();
    let result = self.read(key, now);
    if result.is_hit() {
      self.list.move_to_front(key);
      if self.expiration_mode == ExpirationMode::AfterAccess {
        let expires_at = self.expires_at(now);
        self.list.set_expiry(key, expires_at);
      }
    }
    result
  }

  fn peek(&self, key: &K) -> Lookup<V> {
    self.read(key, time::now_duration())
  }

  fn contains(&self, key: &K) -> bool {
    self.peek(key).is_hit()
  }

  fn remove(&mut self, key: &K) -> bool {
    match self.list.remove(key) {
      Some(node) => {
        self.report(node, RemoveReason::Deleted);
        true
      }
      None => false,
    }
  }

  fn remove_oldest(&mut self) {
    if let Some(node) = self.list.pop_back() {
      self.report(node, RemoveReason::NoSpace);
    }
  }

  fn keys(&self) -> Vec<K> {
    self.list.keys_oldest_first()
  }

  fn len(&self) -> usize {
    self.list.len()
  }

  fn clear(&mut self) {
    for node in self.list.drain() {
      self.report(node, RemoveReason::Clear);
    }
  }

  fn sweep(&mut self, now: Duration) -> usize {
    if self.ttl.is_zero() {
      return 0;
    }
    let expired = self.list.expired_keys(now);
    let mut removed = 0;
    for key in expired {
      if let Some(node) = self.list.remove(&key) {
        self.report(node, RemoveReason::Expired);
        removed += 1;
      }
    }
    removed
  }
}
