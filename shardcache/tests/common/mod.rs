#![allow(dead_code)]

use std::hash::{BuildHasher, Hasher};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use fibre_shardcache::{Cache, CacheBuilder, EvictionListener, RemoveReason};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// A custom hasher that allows us to control which shard a key is assigned to.
// It simply uses the integer value of the key as its hash.
// For a 4-shard cache:
// - key 0 -> shard 0 (0 & 3 = 0)
// - key 1 -> shard 1 (1 & 3 = 1)
// - key 4 -> shard 0 (4 & 3 = 0)
#[derive(Clone, Default)]
pub struct ShardControllingHasher;
impl BuildHasher for ShardControllingHasher {
  type Hasher = TestHasher;
  fn build_hasher(&self) -> Self::Hasher {
    TestHasher(0)
  }
}
pub struct TestHasher(u64);
impl Hasher for TestHasher {
  fn finish(&self) -> u64 {
    self.0
  }
  fn write(&mut self, _: &[u8]) {
    unimplemented!()
  }
  fn write_i32(&mut self, i: i32) {
    self.0 = i as u64;
  }
}

pub type Event<K, V> = (K, Arc<V>, RemoveReason);

// Forwards every notification into a std channel so tests can wait on it.
pub struct ChannelListener<K, V> {
  sender: mpsc::Sender<Event<K, V>>,
}

impl<K: Send, V: Send + Sync> EvictionListener<K, V> for ChannelListener<K, V> {
  fn on_evict(&self, key: K, value: Arc<V>, reason: RemoveReason) {
    // The receiver may already be gone at the end of a test.
    let _ = self.sender.send((key, value, reason));
  }
}

pub fn channel_listener<K, V>() -> (ChannelListener<K, V>, mpsc::Receiver<Event<K, V>>) {
  let (sender, receiver) = mpsc::channel();
  (ChannelListener { sender }, receiver)
}

pub fn build_test_cache(shards: usize) -> Cache<i32, String, ShardControllingHasher> {
  CacheBuilder::new()
    .shards(shards)
    .hasher(ShardControllingHasher)
    .build()
    .unwrap()
}

// Helper to build a bounded cache whose evictions are observable.
pub fn build_observed_cache(
  shards: usize,
  capacity_per_shard: usize,
) -> (
  Cache<i32, String, ShardControllingHasher>,
  mpsc::Receiver<Event<i32, String>>,
) {
  let (listener, events) = channel_listener();
  let cache = CacheBuilder::new()
    .shards(shards)
    .shard_capacity(capacity_per_shard)
    .hasher(ShardControllingHasher)
    .eviction_listener(listener)
    .build()
    .unwrap();
  (cache, events)
}

/// Waits for `n` notifications, failing the test if they do not arrive.
pub fn recv_n<K, V>(events: &mpsc::Receiver<Event<K, V>>, n: usize) -> Vec<Event<K, V>> {
  (0..n)
    .map(|i| {
      events
        .recv_timeout(RECV_TIMEOUT)
        .unwrap_or_else(|_| panic!("notification {} of {} never arrived", i + 1, n))
    })
    .collect()
}

/// Asserts that nothing else is delivered within a short grace period.
pub fn assert_quiet<K, V>(events: &mpsc::Receiver<Event<K, V>>) {
  assert!(
    events.recv_timeout(Duration::from_millis(100)).is_err(),
    "unexpected extra notification"
  );
}
