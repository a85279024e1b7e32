//! Session - glue between raw input and the batch engine.
//!
//! A session owns one [`BlockTracker`] and one [`BatchEngine`], plus strong
//! references to the subscribers it wires up at construction. Raw input
//! chunks are split into lines; block markers become holds, everything else
//! is submitted as a command.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
  BatchEngine, BlockTracker, Command, EngineConfig, EngineStats, Signal, Subscriber,
  config::{Config, MarkerConfig},
};

pub struct Session {
  tracker: BlockTracker,
  engine: BatchEngine,
  /// Keeps the wired-up subscribers alive for the lifetime of the session
  subscribers: Vec<Arc<dyn Subscriber>>,
}

impl Session {
  pub fn new(engine: EngineConfig, markers: MarkerConfig) -> Self {
    Self {
      tracker: BlockTracker::new(markers),
      engine: BatchEngine::new(engine),
      subscribers: Vec::new(),
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(
      EngineConfig::from_batch_config(&config.batch),
      config.markers.clone(),
    )
  }

  /// Attach a subscriber owned by this session
  pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
    self.attach(subscriber);
    self
  }

  /// Attach a subscriber owned by this session
  pub fn attach(&mut self, subscriber: Arc<dyn Subscriber>) {
    self.engine.subscribe_dyn(&subscriber);
    self.subscribers.push(subscriber);
  }

  /// Feed a raw chunk of input. The chunk is split on newlines; blank
  /// lines are discarded and surrounding whitespace is trimmed.
  pub async fn receive(&mut self, chunk: &str) {
    for line in chunk.split('\n') {
      let text = line.trim();
      if text.is_empty() {
        continue;
      }
      self.process(Command::new(text)).await;
    }
  }

  /// Route a single command: markers drive holds, the rest is submitted.
  pub async fn process(&mut self, command: Command) {
    match self.tracker.observe(&command.text) {
      Signal::Open { outermost: true } => {
        self.engine.start_hold().await;
      }
      Signal::Close { outermost: true } => {
        self.engine.end_hold().await;
      }
      signal @ (Signal::Open { .. } | Signal::Close { .. }) => {
        trace!(?signal, depth = self.tracker.depth(), "Nested block marker");
      }
      Signal::Passthrough => {
        self.engine.submit(command).await;
      }
    }
  }

  /// End the session: final flush (unless inside a block), then release
  /// subscribers.
  pub async fn disconnect(self) -> EngineStats {
    let depth = self.tracker.depth();
    let stats = self.engine.shutdown().await;
    debug!(depth, ?stats, "Session disconnected");
    drop(self.subscribers);
    stats
  }

  pub fn engine(&self) -> &BatchEngine {
    &self.engine
  }

  pub fn engine_mut(&mut self) -> &mut BatchEngine {
    &mut self.engine
  }

  pub fn depth(&self) -> usize {
    self.tracker.depth()
  }
}
