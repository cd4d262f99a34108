mod common;

use common::{channel_listener, recv_n};
use fibre_shardcache::policy::lru::LruPolicy;
use fibre_shardcache::{
  BuildError, CacheBuilder, EvictCallback, EvictionPolicy, PolicyConfig, RemoveReason, StrategyRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- LRU Policy Tests ---
mod lru {
  use super::*;

  #[test]
  fn test_lru_eviction_logic() {
    let (listener, events) = channel_listener::<i32, &str>();
    let cache = CacheBuilder::new()
      .shards(1)
      .shard_capacity(3)
      .evict_strategy("LRU")
      .eviction_listener(listener)
      .build()
      .unwrap();

    cache.set(1, "a");
    cache.set(2, "b");
    cache.set(3, "c");
    cache.get(&1);

    cache.set(4, "d");
    let (key, _, reason) = recv_n(&events, 1).remove(0);
    assert_eq!(key, 2, "Key 2 was least recently used");
    assert_eq!(reason, RemoveReason::NoSpace);
    assert_eq!(cache.keys(), vec![3, 1, 4]);
  }
}

// --- FIFO Policy Tests ---
mod fifo {
  use super::*;

  #[test]
  fn test_fifo_keeps_insertion_order_on_overwrite() {
    let (listener, events) = channel_listener::<i32, &str>();
    let cache = CacheBuilder::new()
      .shards(1)
      .shard_capacity(2)
      .evict_strategy("FIFO")
      .eviction_listener(listener)
      .build()
      .unwrap();

    cache.set(1, "a");
    cache.set(2, "b");
    cache.set(1, "a2");
    assert_eq!(cache.keys(), vec![1, 2]);

    cache.set(3, "c");
    let (key, value, _) = recv_n(&events, 1).remove(0);
    assert_eq!(key, 1);
    assert_eq!(*value, "a2");
  }
}

// --- Registry Tests ---
mod registry {
  use super::*;

  #[test]
  fn test_custom_strategy_is_built_once_per_shard() {
    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    let mut registry = StrategyRegistry::<i32, i32>::with_defaults();
    registry.register("counting-lru", |config: PolicyConfig, on_evict: EvictCallback<i32, i32>| {
      BUILDS.fetch_add(1, Ordering::SeqCst);
      Box::new(LruPolicy::new(config, on_evict)) as Box<dyn EvictionPolicy<i32, i32>>
    });

    let cache = CacheBuilder::new()
      .shards(8)
      .registry(registry)
      .evict_strategy("Counting-LRU")
      .build()
      .unwrap();

    assert_eq!(BUILDS.load(Ordering::SeqCst), 8);
    cache.set(1, 1);
    assert_eq!(cache.get(&1).as_deref(), Some(&1));
  }

  #[test]
  fn test_builder_sees_configured_capacity_and_ttl() {
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let seen_clone = seen.clone();

    let mut registry = StrategyRegistry::<i32, i32>::new();
    registry.register("probe", move |config: PolicyConfig, on_evict: EvictCallback<i32, i32>| {
      *seen_clone.lock() = Some(config);
      Box::new(LruPolicy::new(config, on_evict)) as Box<dyn EvictionPolicy<i32, i32>>
    });

    let _cache = CacheBuilder::new()
      .shards(4)
      .max_entry_size(400)
      .expiration(std::time::Duration::from_secs(5))
      .registry(registry)
      .evict_strategy("probe")
      .build()
      .unwrap();

    let config = seen.lock().expect("builder was never called");
    assert_eq!(config.capacity, 100);
    assert_eq!(config.ttl, std::time::Duration::from_secs(5));
  }

  #[test]
  fn test_custom_registry_without_fifo() {
    let mut registry = StrategyRegistry::<i32, i32>::new();
    registry.register("lru", fibre_shardcache::registry::LruBuilder);

    let err = CacheBuilder::new()
      .registry(registry)
      .evict_strategy("FIFO")
      .build()
      .unwrap_err();
    assert_eq!(err, BuildError::UnknownEvictStrategy("FIFO".to_string()));
  }
}

// --- Custom Policy Tests ---
mod custom {
  use super::*;
  use fibre_shardcache::Lookup;

  // Evicts its oldest entry on every read hit.
  struct EvictOnRead(LruPolicy<i32, i32>);

  impl EvictionPolicy<i32, i32> for EvictOnRead {
    fn insert(&mut self, key: i32, value: Arc<i32>) -> bool {
      self.0.insert(key, value)
    }
    fn lookup(&mut self, key: &i32) -> Lookup<i32> {
      let result = self.0.lookup(key);
      if result.is_hit() {
        self.0.remove_oldest();
      }
      result
    }
    fn peek(&self, key: &i32) -> Lookup<i32> {
      self.0.peek(key)
    }
    fn contains(&self, key: &i32) -> bool {
      self.0.contains(key)
    }
    fn remove(&mut self, key: &i32) -> bool {
      self.0.remove(key)
    }
    fn remove_oldest(&mut self) {
      self.0.remove_oldest()
    }
    fn keys(&self) -> Vec<i32> {
      self.0.keys()
    }
    fn len(&self) -> usize {
      self.0.len()
    }
    fn clear(&mut self) {
      self.0.clear()
    }
    fn sweep(&mut self, now: Duration) -> usize {
      self.0.sweep(now)
    }
  }

  #[test]
  fn test_evictions_during_lookup_are_delivered() {
    let mut registry = StrategyRegistry::<i32, i32>::new();
    registry.register("evict-on-read", |config: PolicyConfig, on_evict: EvictCallback<i32, i32>| {
      Box::new(EvictOnRead(LruPolicy::new(config, on_evict))) as Box<dyn EvictionPolicy<i32, i32>>
    });

    let (listener, events) = channel_listener::<i32, i32>();
    let cache = CacheBuilder::new()
      .shards(1)
      .registry(registry)
      .evict_strategy("evict-on-read")
      .eviction_listener(listener)
      .build()
      .unwrap();

    cache.set(1, 1);
    assert_eq!(cache.get(&1).as_deref(), Some(&1));

    let (key, _, reason) = recv_n(&events, 1).remove(0);
    assert_eq!(key, 1);
    assert_eq!(reason, RemoveReason::NoSpace);
    assert_eq!(cache.count(), 0);
  }
}
