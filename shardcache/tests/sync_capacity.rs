mod common;

use common::{assert_quiet, build_observed_cache, channel_listener, recv_n};
use fibre_shardcache::{CacheBuilder, RemoveReason};

#[test]
fn test_least_recently_used_is_evicted() {
  let (listener, events) = channel_listener::<String, u32>();
  let cache = CacheBuilder::new()
    .shards(1)
    .shard_capacity(2)
    .eviction_listener(listener)
    .build()
    .unwrap();

  cache.set("a".to_string(), 1);
  cache.set("b".to_string(), 2);
  cache.set("c".to_string(), 3);

  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, "a");
  assert_eq!(evicted[0].2, RemoveReason::NoSpace);
  assert!(cache.get(&"a".to_string()).is_none());

  // Reading "b" makes "c" the eviction candidate.
  assert!(cache.get(&"b".to_string()).is_some());
  cache.set("d".to_string(), 4);

  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, "c");
  assert_eq!(*evicted[0].1, 3);
  assert_eq!(evicted[0].2, RemoveReason::NoSpace);
  assert_quiet(&events);

  let mut keys = cache.keys();
  keys.sort();
  assert_eq!(keys, vec!["b".to_string(), "d".to_string()]);
}

#[test]
fn test_capacity_is_enforced_per_shard() {
  let (cache, events) = build_observed_cache(2, 2);

  // Even keys land on shard 0, odd keys on shard 1.
  cache.set(0, "zero".to_string());
  cache.set(2, "two".to_string());
  cache.set(1, "one".to_string());
  cache.set(3, "three".to_string());
  assert_eq!(cache.count(), 4);
  assert_quiet(&events);

  cache.set(4, "four".to_string());
  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, 0);
  assert_eq!(evicted[0].2, RemoveReason::NoSpace);

  // Shard 1 was untouched.
  assert!(cache.contains(&1));
  assert!(cache.contains(&3));
  assert_eq!(cache.count(), 4);
}

#[test]
fn test_overwrite_does_not_evict() {
  let (cache, events) = build_observed_cache(1, 2);
  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());
  cache.set(1, "uno".to_string());

  assert_eq!(cache.count(), 2);
  assert_quiet(&events);

  // The overwrite counted as a use, so 2 goes first.
  cache.set(3, "three".to_string());
  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, 2);
}

#[test]
fn test_peek_does_not_protect_from_eviction() {
  let (cache, events) = build_observed_cache(1, 2);
  cache.set(1, "one".to_string());
  cache.set(2, "two".to_string());

  assert!(cache.peek(&1).is_some());
  cache.set(3, "three".to_string());

  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, 1);
}

#[test]
fn test_fifo_ignores_reads() {
  let (listener, events) = channel_listener::<i32, i32>();
  let cache = CacheBuilder::new()
    .shards(1)
    .shard_capacity(2)
    .evict_strategy("fifo")
    .eviction_listener(listener)
    .build()
    .unwrap();

  cache.set(1, 1);
  cache.set(2, 2);
  assert!(cache.get(&1).is_some());
  cache.set(3, 3);

  let evicted = recv_n(&events, 1);
  assert_eq!(evicted[0].0, 1);
  assert_eq!(evicted[0].2, RemoveReason::NoSpace);
}
