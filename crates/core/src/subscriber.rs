//! Subscriber contract.
//!
//! The engine hands each subscriber a snapshot of the pending batch on every
//! change (`update`) and later asks it to act on the last snapshot (`flush`).
//! Flushes of different subscribers run concurrently; a single subscriber's
//! flush never overlaps with itself.

use async_trait::async_trait;

use crate::Command;

#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
  /// Receive the current pending batch. Called synchronously on every
  /// submission and after each flush (with an empty slice). Must be cheap.
  fn update(&self, commands: &[Command]);

  /// Act on the most recently received snapshot.
  async fn flush(&self) -> Result<(), SinkError>;

  /// Human-readable name (for logs)
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

/// Failure inside a subscriber's flush action
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("{0}")]
  Other(String),
}
