//! Name → builder lookup for eviction strategies.
//!
//! A registry is an ordinary value: build one, register what you need, and
//! hand it to [`CacheBuilder::registry`](crate::CacheBuilder::registry).
//! Nothing is registered behind the caller's back.

use crate::policy::fifo::{self, FifoPolicy};
use crate::policy::lru::{self, LruPolicy};
use crate::policy::{EvictCallback, EvictionPolicy, PolicyConfig};

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use ahash::HashMap;

/// Creates one policy instance per shard.
pub trait PolicyBuilder<K, V>: Send + Sync {
  fn build(&self, config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Box<dyn EvictionPolicy<K, V>>;
}

impl<K, V, F> PolicyBuilder<K, V> for F
where
  F: Fn(PolicyConfig, EvictCallback<K, V>) -> Box<dyn EvictionPolicy<K, V>> + Send + Sync,
{
  fn build(&self, config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Box<dyn EvictionPolicy<K, V>> {
    self(config, on_evict)
  }
}

/// Builds [`LruPolicy`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruBuilder;

impl<K, V> PolicyBuilder<K, V> for LruBuilder
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  fn build(&self, config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Box<dyn EvictionPolicy<K, V>> {
    Box::new(LruPolicy::new(config, on_evict))
  }
}

/// Builds [`FifoPolicy`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoBuilder;

impl<K, V> PolicyBuilder<K, V> for FifoBuilder
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  fn build(&self, config: PolicyConfig, on_evict: EvictCallback<K, V>) -> Box<dyn EvictionPolicy<K, V>> {
    Box::new(FifoPolicy::new(config, on_evict))
  }
}

/// A case-insensitive map from strategy name to [`PolicyBuilder`].
pub struct StrategyRegistry<K, V> {
  builders: HashMap<String, Arc<dyn PolicyBuilder<K, V>>>,
}

impl<K, V> fmt::Debug for StrategyRegistry<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StrategyRegistry")
      .field("strategies", &self.names())
      .finish()
  }
}

impl<K, V> Clone for StrategyRegistry<K, V> {
  fn clone(&self) -> Self {
    Self {
      builders: self.builders.clone(),
    }
  }
}

impl<K, V> StrategyRegistry<K, V> {
  /// An empty registry.
  pub fn new() -> Self {
    Self {
      builders: HashMap::default(),
    }
  }

  /// Stores `builder` under `name`, replacing any builder already registered
  /// under the same name in any letter case.
  pub fn register<B>(&mut self, name: &str, builder: B) -> &mut Self
  where
    B: PolicyBuilder<K, V> + 'static,
  {
    self.builders.insert(name.to_lowercase(), Arc::new(builder));
    self
  }

  /// Looks up the builder registered under `name`, ignoring letter case.
  pub fn resolve(&self, name: &str) -> Option<Arc<dyn PolicyBuilder<K, V>>> {
    self.builders.get(&name.to_lowercase()).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.builders.contains_key(&name.to_lowercase())
  }

  /// Registered names, lower-cased and sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.builders.keys().cloned().collect();
    names.sort();
    names
  }
}

impl<K, V> StrategyRegistry<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// A registry holding the strategies shipped with the crate: `LRU` and `FIFO`.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    registry.register(lru::NAME, LruBuilder).register(fifo::NAME, FifoBuilder);
    registry
  }
}

impl<K, V> Default for StrategyRegistry<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  fn default() -> Self {
    Self::with_defaults()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::listener::RemoveReason;
  use crate::policy::ExpirationMode;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn config() -> PolicyConfig {
    PolicyConfig {
      capacity: 4,
      ttl: Duration::ZERO,
      expiration_mode: ExpirationMode::AfterWrite,
    }
  }

  fn noop() -> EvictCallback<i32, i32> {
    Arc::new(|_k: i32, _v: Arc<i32>, _r: RemoveReason| {})
  }

  #[test]
  fn defaults_resolve_case_insensitively() {
    let registry = StrategyRegistry::<i32, i32>::with_defaults();
    assert!(registry.resolve("LRU").is_some());
    assert!(registry.resolve("lru").is_some());
    assert!(registry.resolve("Fifo").is_some());
    assert!(registry.resolve("BOGUS").is_none());
    assert_eq!(registry.names(), vec!["fifo".to_string(), "lru".to_string()]);
  }

  #[test]
  fn empty_registry_resolves_nothing() {
    let registry = StrategyRegistry::<i32, i32>::new();
    assert!(registry.resolve("lru").is_none());
    assert!(!registry.contains("LRU"));
  }

  #[test]
  fn re_registering_overwrites() {
    static CUSTOM_BUILDS: AtomicUsize = AtomicUsize::new(0);

    let mut registry = StrategyRegistry::<i32, i32>::with_defaults();
    registry.register("lru", |config: PolicyConfig, on_evict: EvictCallback<i32, i32>| {
      CUSTOM_BUILDS.fetch_add(1, Ordering::SeqCst);
      Box::new(FifoPolicy::new(config, on_evict)) as Box<dyn EvictionPolicy<i32, i32>>
    });

    let builder = registry.resolve("LRU").unwrap();
    let mut policy = builder.build(config(), noop());
    assert_eq!(CUSTOM_BUILDS.load(Ordering::SeqCst), 1);
    assert_eq!(registry.names().len(), 2);

    policy.insert(1, Arc::new(1));
    assert_eq!(policy.len(), 1);
  }
}
