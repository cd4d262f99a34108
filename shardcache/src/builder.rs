use crate::error::BuildError;
use crate::handles::Cache;
use crate::hasher::Fnv64a;
use crate::listener::{EvictionListener, RemoveReason};
use crate::policy::{ExpirationMode, PolicyConfig};
use crate::registry::StrategyRegistry;
use crate::shared::CacheShared;
use crate::store::{Shard, ShardedStore};
use crate::task::janitor::Janitor;
use crate::task::notifier::Notifier;

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 1024;

/// Default interval between expiry sweeps.
pub const DEFAULT_CLEAN_INTERVAL: Duration = Duration::from_secs(30);

/// Default sizing hint, in entries, for the whole cache.
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 1024 * 1024;

/// Default eviction strategy name.
pub const DEFAULT_EVICT_STRATEGY: &str = crate::policy::lru::NAME;

/// Default number of slots in the eviction-notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

/// Lower bound on the per-shard capacity derived from `max_entry_size`.
pub const MIN_ENTRIES_PER_SHARD: usize = 10;

/// A builder for creating [`Cache`] instances.
pub struct CacheBuilder<K: Send, V: Send + Sync, H = Fnv64a> {
  shards: usize,
  expiration: Duration,
  expiration_mode: ExpirationMode,
  evict_strategy: String,
  registry: Option<StrategyRegistry<K, V>>,
  clean_interval: Duration,
  max_entry_size: usize,
  shard_capacity: Option<usize>,
  hasher: H,
  listener: Option<Arc<dyn EvictionListener<K, V>>>,
  notification_capacity: usize,
}

// Manual Debug implementation for CacheBuilder.
impl<K: Send, V: Send + Sync, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("shards", &self.shards)
      .field("expiration", &self.expiration)
      .field("expiration_mode", &self.expiration_mode)
      .field("evict_strategy", &self.evict_strategy)
      .field("clean_interval", &self.clean_interval)
      .field("max_entry_size", &self.max_entry_size)
      .field("shard_capacity", &self.shard_capacity)
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- Default Constructor ---
impl<K: Send, V: Send + Sync> CacheBuilder<K, V, Fnv64a> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      shards: DEFAULT_SHARDS,
      expiration: Duration::ZERO,
      expiration_mode: ExpirationMode::AfterWrite,
      evict_strategy: DEFAULT_EVICT_STRATEGY.to_string(),
      registry: None,
      clean_interval: DEFAULT_CLEAN_INTERVAL,
      max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
      shard_capacity: None,
      hasher: Fnv64a,
      listener: None,
      notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
    }
  }
}

impl<K: Send, V: Send + Sync> Default for CacheBuilder<K, V, Fnv64a> {
  fn default() -> Self {
    Self::new()
  }
}

// --- General Configuration Methods ---
impl<K: Send, V: Send + Sync, H> CacheBuilder<K, V, H> {
  /// Sets the number of shards. Must be a power of two; anything else makes
  /// `build` fail with [`BuildError::InvalidShardCount`].
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = shards;
    self
  }

  /// Sets the time-to-live applied to every written entry.
  /// `Duration::ZERO` disables expiry.
  pub fn expiration(mut self, ttl: Duration) -> Self {
    self.expiration = ttl;
    self
  }

  /// Chooses whether reads refresh the time-to-live.
  pub fn expiration_mode(mut self, mode: ExpirationMode) -> Self {
    self.expiration_mode = mode;
    self
  }

  /// Selects the eviction strategy by registry name, ignoring letter case.
  pub fn evict_strategy(mut self, name: impl Into<String>) -> Self {
    self.evict_strategy = name.into();
    self
  }

  /// Resolves strategies against `registry` instead of the default one.
  pub fn registry(mut self, registry: StrategyRegistry<K, V>) -> Self {
    self.registry = Some(registry);
    self
  }

  /// Sets the period of the background expiry sweep.
  /// `Duration::ZERO` disables the sweep.
  pub fn clean_interval(mut self, interval: Duration) -> Self {
    self.clean_interval = interval;
    self
  }

  /// Sizing hint for the whole cache. Each shard holds at most
  /// `max(max_entry_size / shards, MIN_ENTRIES_PER_SHARD)` entries.
  pub fn max_entry_size(mut self, entries: usize) -> Self {
    self.max_entry_size = entries;
    self
  }

  /// Sets the per-shard capacity directly, overriding `max_entry_size`.
  /// Zero makes each shard unbounded.
  pub fn shard_capacity(mut self, entries: usize) -> Self {
    self.shard_capacity = Some(entries);
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets a closure as the eviction listener.
  pub fn on_remove<F>(self, f: F) -> Self
  where
    F: Fn(K, Arc<V>, RemoveReason) + Send + Sync + 'static,
  {
    self.eviction_listener(f)
  }

  /// Sets how many notifications may be queued for the listener before
  /// evicting threads wait for it to catch up.
  pub fn notification_capacity(mut self, capacity: usize) -> Self {
    self.notification_capacity = capacity;
    self
  }

  /// Replaces the key hasher.
  pub fn hasher<H2>(self, hasher: H2) -> CacheBuilder<K, V, H2>
  where
    H2: BuildHasher,
  {
    CacheBuilder {
      shards: self.shards,
      expiration: self.expiration,
      expiration_mode: self.expiration_mode,
      evict_strategy: self.evict_strategy,
      registry: self.registry,
      clean_interval: self.clean_interval,
      max_entry_size: self.max_entry_size,
      shard_capacity: self.shard_capacity,
      hasher,
      listener: self.listener,
      notification_capacity: self.notification_capacity,
    }
  }

  fn capacity_per_shard(&self) -> usize {
    self
      .shard_capacity
      .unwrap_or_else(|| (self.max_entry_size / self.shards.max(1)).max(MIN_ENTRIES_PER_SHARD))
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  /// Builds a `Cache`.
  pub fn build(mut self) -> Result<Cache<K, V, H>, BuildError> {
    self.validate()?;

    let registry = self.registry.take().unwrap_or_else(StrategyRegistry::with_defaults);
    let builder = registry
      .resolve(&self.evict_strategy)
      .ok_or_else(|| BuildError::UnknownEvictStrategy(self.evict_strategy.clone()))?;

    let capacity_per_shard = self.capacity_per_shard();
    let config = PolicyConfig {
      capacity: capacity_per_shard,
      ttl: self.expiration,
      expiration_mode: self.expiration_mode,
    };

    let notifier = self
      .listener
      .take()
      .map(|listener| Notifier::spawn(listener, self.notification_capacity));

    let shards = (0..self.shards)
      .map(|_| Shard::new(builder.as_ref(), config, notifier.clone()))
      .collect();
    let store = Arc::new(ShardedStore::new(shards, self.hasher));

    let janitor = if !self.clean_interval.is_zero() && !self.expiration.is_zero() {
      Some(Janitor::spawn(Arc::clone(&store), self.clean_interval))
    } else {
      None
    };

    debug!(
      shards = self.shards,
      capacity_per_shard,
      strategy = %self.evict_strategy,
      expiration = ?self.expiration,
      sweeping = janitor.is_some(),
      "cache built"
    );

    Ok(Cache {
      shared: Arc::new(CacheShared {
        store,
        janitor: Mutex::new(janitor),
        notifier,
        strategy: self.evict_strategy,
        capacity_per_shard,
        expiration: self.expiration,
        closed: AtomicBool::new(false),
      }),
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if !self.shards.is_power_of_two() {
      return Err(BuildError::InvalidShardCount(self.shards));
    }
    Ok(())
  }
}
