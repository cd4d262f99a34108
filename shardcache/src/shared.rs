use crate::error::CloseError;
use crate::store::ShardedStore;
use crate::task::janitor::Janitor;
use crate::task::notifier::{self, Notifier};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<K: Send, V: Send + Sync, H> {
  pub(crate) store: Arc<ShardedStore<K, V, H>>,
  pub(crate) janitor: Mutex<Option<Janitor>>,
  pub(crate) notifier: Option<Arc<Notifier<K, V>>>,
  pub(crate) strategy: String,
  pub(crate) capacity_per_shard: usize,
  pub(crate) expiration: Duration,
  pub(crate) closed: AtomicBool,
}

impl<K: Send, V: Send + Sync, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("shards", &self.store.shards.len())
      .field("strategy", &self.strategy)
      .field("capacity_per_shard", &self.capacity_per_shard)
      .field("expiration", &self.expiration)
      .field("closed", &self.closed.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

impl<K: Send, V: Send + Sync, H> CacheShared<K, V, H> {
  /// Stops the expiry janitor. Only the first call does any work; later
  /// calls return `Ok(())`.
  ///
  /// The notifier keeps running so removals after close are still reported.
  /// It is disconnected when the last handle is dropped.
  pub(crate) fn close(&self) -> Result<(), CloseError> {
    if self.closed.swap(true, Ordering::AcqRel) {
      return Ok(());
    }

    let Some(janitor) = self.janitor.lock().take() else {
      debug!("cache closed");
      return Ok(());
    };

    // The janitor may be blocked handing notifications to the very thread we
    // are running on; joining from there would never return.
    let join = !notifier::on_notifier_thread();
    let result = janitor.stop(join);
    match &result {
      Ok(()) => debug!("cache closed"),
      Err(err) => warn!(%err, "cache closed with a failed janitor"),
    }
    result
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool {
    self.closed.load(Ordering::Acquire)
  }
}

impl<K: Send, V: Send + Sync, H> Drop for CacheShared<K, V, H> {
  fn drop(&mut self) {
    let _ = self.close();
    if let Some(notifier) = &self.notifier {
      notifier.stop();
    }
  }
}
