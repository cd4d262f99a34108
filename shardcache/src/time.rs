//! The cache clock. Timestamps are `Duration`s since a lazily initialised,
//! process-wide monotonic epoch.

use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single, static reference point for all expiry calculations in the cache.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Converts an `Instant` into a `Duration` since the cache's epoch.
#[inline]
pub(crate) fn instant_to_duration(instant: Instant) -> Duration {
  instant.saturating_duration_since(*CACHE_EPOCH)
}

/// The current time as a `Duration` since the epoch.
#[inline]
pub fn now_duration() -> Duration {
  instant_to_duration(Instant::now())
}

/// Computes the absolute expiry for an entry written now.
///
/// A zero `ttl` means the entry never expires and yields `None`.
#[inline]
pub fn expiry_from(now: Duration, ttl: Duration) -> Option<Duration> {
  if ttl.is_zero() {
    None
  } else {
    Some(now.saturating_add(ttl))
  }
}

/// Returns `true` if an entry with the given expiry is no longer live at `now`.
#[inline]
pub fn is_expired(expires_at: Option<Duration>, now: Duration) -> bool {
  matches!(expires_at, Some(at) if now >= at)
}
