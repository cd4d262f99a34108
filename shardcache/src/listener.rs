use std::fmt;
use std::sync::Arc;

/// Describes the reason an entry was removed from the cache.
///
/// The discriminants are stable and may be used as wire or log codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RemoveReason {
  /// The entry outlived its time-to-live and was removed by a sweep.
  Expired = 0,
  /// The entry was the least valuable one when its shard went over capacity.
  NoSpace = 1,
  /// The entry was explicitly deleted.
  Deleted = 2,
  /// The entry was dropped by a bulk clear.
  Clear = 3,
}

impl RemoveReason {
  /// Returns the numeric code of this reason.
  #[inline]
  pub fn code(self) -> u32 {
    self as u32
  }
}

impl fmt::Display for RemoveReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RemoveReason::Expired => write!(f, "expired"),
      RemoveReason::NoSpace => write!(f, "evicted due to capacity"),
      RemoveReason::Deleted => write!(f, "deleted"),
      RemoveReason::Clear => write!(f, "cleared"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when entries leave it.
///
/// `on_evict` is called with the key, value, and reason for the removal. It
/// always runs on the cache's dedicated notifier thread, never while a shard
/// lock is held, so it may call back into the cache. A panic raised here is
/// caught and logged; it never reaches the cache or the sweeper.
pub trait EvictionListener<K, V>: Send + Sync {
  fn on_evict(&self, key: K, value: Arc<V>, reason: RemoveReason);
}

impl<K, V, F> EvictionListener<K, V> for F
where
  F: Fn(K, Arc<V>, RemoveReason) + Send + Sync,
{
  fn on_evict(&self, key: K, value: Arc<V>, reason: RemoveReason) {
    self(key, value, reason)
  }
}
