use crate::error::CloseError;
use crate::store::ShardedStore;
use crate::time;

use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

/// Wakes the janitor early when the cache is closed.
#[derive(Debug, Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  condvar: Condvar,
}

/// The background task responsible for removing expired entries.
///
/// A single thread runs one pass over every shard per tick. A pass that
/// overruns the interval is followed immediately by the next one, so passes
/// never overlap and none is skipped.
pub(crate) struct Janitor {
  handle: JoinHandle<()>,
  signal: Arc<StopSignal>,
}

impl Janitor {
  /// Spawns a new janitor thread.
  pub(crate) fn spawn<K, V, H>(store: Arc<ShardedStore<K, V, H>>, tick_interval: Duration) -> Self
  where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: BuildHasher + Send + Sync + 'static,
  {
    let signal = Arc::new(StopSignal::default());
    let thread_signal = signal.clone();

    let handle = thread::spawn(move || {
      debug!(interval = ?tick_interval, "expiry janitor started");
      loop {
        let tick_start = Instant::now();

        let removed = store.sweep(time::now_duration());
        if removed > 0 {
          debug!(removed, elapsed = ?tick_start.elapsed(), "expiry sweep finished");
        } else {
          trace!("expiry sweep found nothing to remove");
        }

        // Sleep for the remaining duration of the tick interval. An interval
        // too large to represent as an `Instant` means waiting for stop only.
        let deadline = tick_start.checked_add(tick_interval);
        let mut stopped = thread_signal.stopped.lock();
        while !*stopped {
          match deadline {
            Some(deadline) => {
              if thread_signal.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
              }
            }
            None => thread_signal.condvar.wait(&mut stopped),
          }
        }
        if *stopped {
          break;
        }
      }
      debug!("expiry janitor stopped");
    });

    Self { handle, signal }
  }

  /// Signals the janitor thread to stop after its current pass.
  ///
  /// With `join` set, waits for the thread to exit and reports whether it
  /// panicked. Otherwise the thread is left to finish on its own.
  pub(crate) fn stop(self, join: bool) -> Result<(), CloseError> {
    *self.signal.stopped.lock() = true;
    self.signal.condvar.notify_all();

    if join {
      self.handle.join().map_err(|_| CloseError::SweeperPanicked)
    } else {
      Ok(())
    }
  }
}
