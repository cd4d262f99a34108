use thiserror::Error;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The shard count was not a non-zero power of two.
  #[error("shard count must be a power of two, got {0}")]
  InvalidShardCount(usize),
  /// The requested eviction strategy is not present in the registry.
  #[error("unknown eviction strategy '{0}'")]
  UnknownEvictStrategy(String),
}

/// Errors that can occur when closing a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
  /// The background sweeper thread terminated by panicking.
  #[error("the expiry sweeper thread panicked")]
  SweeperPanicked,
}
