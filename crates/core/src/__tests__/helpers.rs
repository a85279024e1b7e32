//! Test subscribers for engine and session tests.
//!
//! `RecordingSubscriber` keeps every snapshot it is handed and every batch it
//! flushes, so tests can assert on exact batch boundaries.

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use async_trait::async_trait;

use crate::{Command, SinkError, Subscriber};

/// Tracks how many flushes are running at the same time
#[derive(Debug, Default)]
pub struct FlushGauge {
  current: AtomicUsize,
  peak: AtomicUsize,
}

impl FlushGauge {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  fn enter(&self) {
    let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
  }

  fn exit(&self) {
    self.current.fetch_sub(1, Ordering::SeqCst);
  }

  pub fn peak(&self) -> usize {
    self.peak.load(Ordering::SeqCst)
  }
}

pub struct RecordingSubscriber {
  name: String,
  snapshot: Mutex<Vec<Command>>,
  updates: AtomicUsize,
  flushed: Mutex<Vec<Vec<String>>>,
  delay: Option<Duration>,
  gauge: Option<Arc<FlushGauge>>,
}

impl RecordingSubscriber {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      snapshot: Mutex::new(Vec::new()),
      updates: AtomicUsize::new(0),
      flushed: Mutex::new(Vec::new()),
      delay: None,
      gauge: None,
    }
  }

  /// Sleep inside every flush, reporting to `gauge` while busy
  pub fn slow(name: &str, delay: Duration, gauge: Arc<FlushGauge>) -> Self {
    Self {
      delay: Some(delay),
      gauge: Some(gauge),
      ..Self::new(name)
    }
  }

  pub fn snapshot_texts(&self) -> Vec<String> {
    self.snapshot.lock().unwrap().iter().map(|c| c.text.clone()).collect()
  }

  pub fn update_count(&self) -> usize {
    self.updates.load(Ordering::SeqCst)
  }

  pub fn flushed(&self) -> Vec<Vec<String>> {
    self.flushed.lock().unwrap().clone()
  }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
  fn update(&self, commands: &[Command]) {
    self.updates.fetch_add(1, Ordering::SeqCst);
    *self.snapshot.lock().unwrap() = commands.to_vec();
  }

  async fn flush(&self) -> Result<(), SinkError> {
    if let Some(gauge) = &self.gauge {
      gauge.enter();
    }
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    let batch = self.snapshot_texts();
    self.flushed.lock().unwrap().push(batch);

    if let Some(gauge) = &self.gauge {
      gauge.exit();
    }
    Ok(())
  }

  fn name(&self) -> &str {
    &self.name
  }
}

/// Subscriber whose flush always fails
pub struct FailingSubscriber;

#[async_trait]
impl Subscriber for FailingSubscriber {
  fn update(&self, _commands: &[Command]) {}

  async fn flush(&self) -> Result<(), SinkError> {
    Err(SinkError::Other("disk full".to_string()))
  }
}

/// Subscriber whose flush panics
pub struct PanickingSubscriber;

#[async_trait]
impl Subscriber for PanickingSubscriber {
  fn update(&self, _commands: &[Command]) {}

  async fn flush(&self) -> Result<(), SinkError> {
    panic!("subscriber exploded");
  }
}

/// Owned strings for comparing against `RecordingSubscriber::flushed`
pub fn batch(texts: &[&str]) -> Vec<String> {
  texts.iter().map(|t| t.to_string()).collect()
}
