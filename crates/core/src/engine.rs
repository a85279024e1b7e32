//! Batch engine - accumulates commands and fans flushes out to subscribers.
//!
//! # Flush policy
//!
//! - A submission that brings the pending batch to `batch_size` flushes it,
//!   unless a hold is active.
//! - `start_hold` flushes whatever is pending so that a block always starts
//!   from an empty batch, then suspends size-based flushing.
//! - `end_hold` lifts the hold and flushes the block contents regardless of size.
//! - `shutdown` flushes the remainder unless a hold is active.
//!
//! # Fan-out
//!
//! Each live subscriber's flush runs as its own tokio task. The flush call
//! does not return until every task has finished, so a batch is fully handled
//! before the next one can start. A subscriber that fails or panics is logged
//! and counted; the others are unaffected.

use std::sync::{Arc, Weak};

use tokio::sync::Semaphore;
use tracing::{debug, error, trace, warn};

use crate::{
  Command, Subscriber,
  command::texts,
  config::BatchConfig,
  subscriber::SinkError,
};

/// Configuration for the batch engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Pending size that triggers a flush (at least 1)
  pub batch_size: usize,
  /// Upper bound on concurrently running subscriber flushes (None = one task per subscriber)
  pub max_parallel_flushes: Option<usize>,
}

impl EngineConfig {
  pub fn new(batch_size: usize) -> Self {
    Self {
      batch_size: batch_size.max(1),
      max_parallel_flushes: None,
    }
  }

  pub fn from_batch_config(config: &BatchConfig) -> Self {
    Self::new(config.size).with_max_parallel_flushes(config.max_parallel_flushes)
  }

  /// Limit concurrent flushes; 0 means unbounded
  pub fn with_max_parallel_flushes(mut self, limit: usize) -> Self {
    self.max_parallel_flushes = (limit > 0).then_some(limit);
    self
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self::from_batch_config(&BatchConfig::default())
  }
}

/// Running totals for an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
  pub commands_submitted: usize,
  pub batches_flushed: usize,
  pub commands_flushed: usize,
  pub subscriber_failures: usize,
}

/// Outcome of a single flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
  /// Number of commands in the flushed batch (0 = nothing was flushed)
  pub commands: usize,
  /// Subscribers whose flush completed successfully
  pub delivered: usize,
  /// Subscribers whose flush returned an error or panicked
  pub failed: usize,
}

impl FlushReport {
  pub fn is_empty(&self) -> bool {
    self.commands == 0
  }
}

pub struct BatchEngine {
  config: EngineConfig,
  pending: Vec<Command>,
  held: bool,
  subscribers: Vec<Weak<dyn Subscriber>>,
  limiter: Option<Arc<Semaphore>>,
  stats: EngineStats,
  shut_down: bool,
}

impl BatchEngine {
  pub fn new(config: EngineConfig) -> Self {
    let limiter = config.max_parallel_flushes.map(|n| Arc::new(Semaphore::new(n)));
    Self {
      config,
      pending: Vec::new(),
      held: false,
      subscribers: Vec::new(),
      limiter,
      stats: EngineStats::default(),
      shut_down: false,
    }
  }

  pub fn with_batch_size(batch_size: usize) -> Self {
    Self::new(EngineConfig::new(batch_size))
  }

  // ==========================================================================
  // Subscribers
  // ==========================================================================

  /// Register a subscriber. The engine keeps only a weak handle, so the
  /// subscriber lives exactly as long as its owner keeps it.
  ///
  /// Subscribing the same subscriber twice is a no-op.
  pub fn subscribe<S: Subscriber>(&mut self, subscriber: &Arc<S>) {
    let weak = Arc::downgrade(subscriber);
    self.register(weak);
  }

  /// [`subscribe`](Self::subscribe) for an already type-erased subscriber
  pub fn subscribe_dyn(&mut self, subscriber: &Arc<dyn Subscriber>) {
    self.register(Arc::downgrade(subscriber));
  }

  /// Remove a subscriber. Unknown handles are ignored.
  pub fn unsubscribe<S: Subscriber>(&mut self, subscriber: &Arc<S>) {
    let weak = Arc::downgrade(subscriber);
    self.deregister(weak);
  }

  pub fn unsubscribe_dyn(&mut self, subscriber: &Arc<dyn Subscriber>) {
    self.deregister(Arc::downgrade(subscriber));
  }

  fn register(&mut self, subscriber: Weak<dyn Subscriber>) {
    if self.position(&subscriber).is_none() {
      self.subscribers.push(subscriber);
    }
  }

  fn deregister(&mut self, subscriber: Weak<dyn Subscriber>) {
    if let Some(idx) = self.position(&subscriber) {
      self.subscribers.remove(idx);
    }
  }

  /// Number of registered subscribers that are still alive
  pub fn subscriber_count(&self) -> usize {
    self.subscribers.iter().filter(|s| s.strong_count() > 0).count()
  }

  fn position(&self, subscriber: &Weak<dyn Subscriber>) -> Option<usize> {
    let target = Weak::as_ptr(subscriber) as *const ();
    self
      .subscribers
      .iter()
      .position(|s| std::ptr::eq(Weak::as_ptr(s) as *const (), target))
  }

  /// Upgrade every live handle, dropping dead ones from the registry
  fn live_subscribers(&mut self) -> Vec<Arc<dyn Subscriber>> {
    let mut live = Vec::with_capacity(self.subscribers.len());
    self.subscribers.retain(|weak| match weak.upgrade() {
      Some(subscriber) => {
        live.push(subscriber);
        true
      }
      None => false,
    });
    live
  }

  fn notify(&mut self) {
    let live = self.live_subscribers();
    trace!(pending = self.pending.len(), subscribers = live.len(), "Notifying subscribers");
    for subscriber in live {
      subscriber.update(&self.pending);
    }
  }

  // ==========================================================================
  // Ingestion
  // ==========================================================================

  /// Append a command and publish the new snapshot. Flushes when the batch
  /// is full and no hold is active; returns the flush outcome in that case.
  pub async fn submit(&mut self, command: Command) -> Option<FlushReport> {
    self.pending.push(command);
    self.stats.commands_submitted += 1;
    self.notify();

    if !self.held && self.pending.len() >= self.config.batch_size {
      Some(self.flush().await)
    } else {
      None
    }
  }

  /// Begin a block: flush what is pending, then suspend size-based flushing.
  pub async fn start_hold(&mut self) -> FlushReport {
    let report = self.flush().await;
    self.held = true;
    debug!(flushed = report.commands, "Hold started");
    report
  }

  /// End a block: lift the hold and flush its contents in full.
  pub async fn end_hold(&mut self) -> FlushReport {
    self.held = false;
    let report = self.flush().await;
    debug!(flushed = report.commands, "Hold released");
    report
  }

  // ==========================================================================
  // Flush
  // ==========================================================================

  /// Hand the pending batch to every live subscriber and clear it.
  ///
  /// An empty batch is a no-op: no subscriber is called or notified.
  pub async fn flush(&mut self) -> FlushReport {
    if self.pending.is_empty() {
      return FlushReport::default();
    }

    let live = self.live_subscribers();
    let commands = self.pending.len();
    debug!(
      commands,
      subscribers = live.len(),
      batch = ?texts(&self.pending),
      "Flushing batch"
    );

    let mut names = Vec::with_capacity(live.len());
    let mut tasks = Vec::with_capacity(live.len());
    for subscriber in live {
      names.push(subscriber.name().to_string());
      let limiter = self.limiter.clone();
      tasks.push(tokio::spawn(async move {
        let _permit = match limiter {
          Some(limiter) => match limiter.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => return Err(SinkError::Other("flush limiter closed".to_string())),
          },
          None => None,
        };
        subscriber.flush().await
      }));
    }

    // Join barrier: every subscriber finishes this batch before we move on
    let results = futures::future::join_all(tasks).await;

    let mut report = FlushReport {
      commands,
      ..Default::default()
    };
    for (name, result) in names.iter().zip(results) {
      match result {
        Ok(Ok(())) => report.delivered += 1,
        Ok(Err(e)) => {
          error!(subscriber = %name, error = %e, "Subscriber flush failed");
          report.failed += 1;
        }
        Err(e) => {
          error!(subscriber = %name, error = %e, "Subscriber flush task panicked");
          report.failed += 1;
        }
      }
    }

    self.stats.batches_flushed += 1;
    self.stats.commands_flushed += commands;
    self.stats.subscriber_failures += report.failed;

    self.pending.clear();
    self.notify();

    report
  }

  // ==========================================================================
  // Lifecycle
  // ==========================================================================

  /// Tear the engine down.
  ///
  /// Flushes the remaining batch unless a hold is active, in which case the
  /// unfinished block is dropped. Releases every subscriber handle.
  pub async fn shutdown(mut self) -> EngineStats {
    if self.held {
      if !self.pending.is_empty() {
        warn!(
          dropped = self.pending.len(),
          "Shutting down inside an open block, dropping pending commands"
        );
      }
      self.pending.clear();
    } else {
      self.flush().await;
    }

    self.subscribers.clear();
    self.shut_down = true;
    debug!(stats = ?self.stats, "Batch engine shut down");
    self.stats
  }

  // ==========================================================================
  // Accessors
  // ==========================================================================

  pub fn pending(&self) -> &[Command] {
    &self.pending
  }

  pub fn is_held(&self) -> bool {
    self.held
  }

  pub fn batch_size(&self) -> usize {
    self.config.batch_size
  }

  pub fn stats(&self) -> EngineStats {
    self.stats
  }
}

impl Drop for BatchEngine {
  fn drop(&mut self) {
    if !self.shut_down && !self.held && !self.pending.is_empty() {
      warn!(
        pending = self.pending.len(),
        "Batch engine dropped without shutdown, pending commands were not flushed"
      );
    }
  }
}

impl std::fmt::Debug for BatchEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BatchEngine")
      .field("config", &self.config)
      .field("pending", &self.pending.len())
      .field("held", &self.held)
      .field("subscribers", &self.subscribers.len())
      .field("stats", &self.stats)
      .finish()
  }
}
