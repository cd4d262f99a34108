use super::{EntryList, EvictCallback, EvictionPolicy, ExpirationMode, Lookup, PolicyConfig};
use crate::listener::RemoveReason;
use crate::time;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// The name the FIFO strategy is registered under.
pub const NAME: &str = "FIFO";

/// An eviction policy that evicts entries in a First-In, First-Out manner.
///
/// Reads never reorder entries and overwriting a key keeps its original
/// position, which preserves the "First-In" part of the name.
pub struct FifoPolicy<K, V> {
  list: EntryList<K, V>,
  capacity: usize,
  ttl: Duration,
  expiration_mode: ExpirationMode,
  on_evict: EvictCallback<K, V>,
}

impl<K, V> fmt::Debug for FifoPolicy<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FifoPolicy")
      .field("capacity", &self.capacity)
      .field("ttl", &self.ttl)
      .finish_non_exhaustive()
  }
}

impl<K: Eq + Hash + Clone, V> FifoPolicy<K, V> {
  pub fn new(config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Self {
    Self {
      list: EntryList::with_capacity(config.capacity),
      capacity: config.capacity,
      ttl: config.ttl,
      expiration_mode: config.expiration_mode,
      on_evict,
    }
  }
}

impl<K, V> EvictionPolicy<K, V> for FifoPolicy<K, V>
where
  K: Eq + Hash + Clone + Send + Sync,
  V: Send + Sync,
{
  fn insert(&mut self, key: K, value: Arc<V>) -> bool {
    let expires_at = time::expiry_from(time::now_duration(), self.ttl);
    if self.list.update(&key, value.clone(), expires_at).is_some() {
      return true;
    }

    self.list.push_front(key, value, expires_at);
    if self.capacity != 0 && self.list.len() > self.capacity {
      self.remove_oldest();
    }
    true
  }

  fn lookup(&mut self, key: &K) -> Lookup<V> {
    let now = time::now_duration();
    let result = self.peek(key);
    if result.is_hit() && self.expiration_mode == ExpirationMode::AfterAccess {
      self.list.set_expiry(key, time::expiry_from(now, self.ttl));
    }
    result
  }

  fn peek(&self, key: &K) -> Lookup<V> {
    match self.list.get(key) {
      None => Lookup::Miss,
      Some(node) if node.is_expired(time::now_duration()) => Lookup::Stale(node.value.clone()),
      Some(node) => Lookup::Hit(node.value.clone()),
    }
  }

  fn contains(&self, key: &K) -> bool {
    self.peek(key).is_hit()
  }

  fn remove(&mut self, key: &K) -> bool {
    match self.list.remove(key) {
      Some(node) => {
        (self.on_evict)(node.key, node.value, RemoveReason::Deleted);
        true
      }
      None => false,
    }
  }

  fn remove_oldest(&mut self) {
    if let Some(node) = self.list.pop_back() {
      (self.on_evict)(node.key, node.value, RemoveReason::NoSpace);
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
      (self.on_evict)(node.key, node.value, RemoveReason::Clear);
    }
  }

  fn sweep(&mut self, now: Duration) -> usize {
    let expired = self.list.expired_keys(now);
    let count = expired.len();
    for key in expired {
      if let Some(node) = self.list.remove(&key) {
        (self.on_evict)(node.key, node.value, RemoveReason::Expired);
      }
    }
    count
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use parking_lot::Mutex;

  #[test]
  fn reads_do_not_protect_from_eviction() {
    let evicted: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = evicted.clone();
    let mut fifo = FifoPolicy::new(
      PolicyConfig {
        capacity: 2,
        ttl: Duration::ZERO,
        expiration_mode: ExpirationMode::AfterWrite,
      },
      Arc::new(move |k: i32, _v: Arc<i32>, _r: RemoveReason| sink.lock().push(k)),
    );

    fifo.insert(1, Arc::new(1));
    fifo.insert(2, Arc::new(2));
    assert!(fifo.lookup(&1).is_hit());
    fifo.insert(1, Arc::new(11));
    assert_eq!(fifo.keys(), vec![1, 2], "Overwrite keeps insertion order");

    fifo.insert(3, Arc::new(3));
    assert_eq!(*evicted.lock(), vec![1]);
    assert_eq!(fifo.keys(), vec![2, 3]);
  }
}
