use crate::listener::{EvictionListener, RemoveReason};

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use fibre::mpsc;
use fibre::TrySendError;
use parking_lot::RwLock;
use tracing::{debug, error};

/// A message sent to the notifier task.
pub(crate) type Notification<K, V> = (K, Arc<V>, RemoveReason);

thread_local! {
  // Set on the notifier thread so re-entrant dispatch never blocks on itself.
  static ON_NOTIFIER: Cell<bool> = Cell::new(false);
}

/// Returns `true` when called from a notifier thread, i.e. from inside a
/// user eviction listener.
pub(crate) fn on_notifier_thread() -> bool {
  ON_NOTIFIER.with(|flag| flag.get())
}

/// The background task responsible for calling the user-provided eviction
/// listener.
pub(crate) struct Notifier<K: Send, V: Send + Sync> {
  sender: RwLock<Option<mpsc::BoundedSender<Notification<K, V>>>>,
  listener: Arc<dyn EvictionListener<K, V>>,
}

impl<K: Send, V: Send + Sync> Notifier<K, V> {
  /// Spawns a new notifier thread fed by a channel of `capacity` slots.
  pub(crate) fn spawn(listener: Arc<dyn EvictionListener<K, V>>, capacity: usize) -> Arc<Self>
  where
    K: 'static,
    V: 'static,
  {
    let (tx, rx): (
      mpsc::BoundedSender<Notification<K, V>>,
      mpsc::BoundedReceiver<Notification<K, V>>,
    ) = mpsc::bounded(capacity.max(1));

    let thread_listener = listener.clone();
    thread::spawn(move || {
      ON_NOTIFIER.with(|flag| flag.set(true));
      // The loop ends once every sender is gone and the queue is drained.
      while let Ok((key, value, reason)) = rx.recv() {
        deliver(thread_listener.as_ref(), key, value, reason);
      }
      debug!("eviction notifier stopped");
    });

    Arc::new(Self {
      sender: RwLock::new(Some(tx)),
      listener,
    })
  }

  /// Queues a batch of notifications for the listener.
  ///
  /// Blocks while the channel is full, except on the notifier thread itself:
  /// there a full channel means the listener is evicting from inside a
  /// callback, and the notification is delivered inline instead.
  pub(crate) fn dispatch(&self, batch: Vec<Notification<K, V>>) {
    // Clone the sender so the lock is not held across a blocking send.
    let sender = match self.sender.read().as_ref() {
      Some(sender) => sender.clone(),
      None => {
        debug!(dropped = batch.len(), "eviction notifier stopped, dropping notifications");
        return;
      }
    };

    let inline = on_notifier_thread();
    for notification in batch {
      if inline {
        match sender.try_send(notification) {
          Ok(()) => {}
          Err(TrySendError::Full((key, value, reason))) => {
            deliver(self.listener.as_ref(), key, value, reason);
          }
          Err(_) => debug!("eviction notifier disconnected"),
        }
      } else if sender.send(notification).is_err() {
        debug!("eviction notifier disconnected");
      }
    }
  }

  /// Disconnects the channel. Already queued notifications are still
  /// delivered, after which the notifier thread exits.
  pub(crate) fn stop(&self) {
    self.sender.write().take();
  }
}

impl<K: Send, V: Send + Sync> Drop for Notifier<K, V> {
  fn drop(&mut self) {
    self.stop();
  }
}

/// Calls the listener inside a panic boundary.
fn deliver<K, V>(listener: &dyn EvictionListener<K, V>, key: K, value: Arc<V>, reason: RemoveReason) {
  let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_evict(key, value, reason)));
  if let Err(payload) = outcome {
    error!(
      %reason,
      panic = panic_message(payload.as_ref()),
      "eviction listener panicked; notification discarded"
    );
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.as_str()
  } else {
    "<non-string panic payload>"
  }
}
