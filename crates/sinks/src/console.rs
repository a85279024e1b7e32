//! ConsoleSink - prints each flushed batch as one line.

use std::{
  io::Write,
  sync::Mutex,
};

use async_trait::async_trait;
use bulk_core::{Command, SinkError, Subscriber};

use crate::format::format_batch;

pub struct ConsoleSink {
  prefix: String,
  snapshot: Mutex<Vec<Command>>,
  out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
  pub fn stdout(prefix: &str) -> Self {
    Self::with_writer(prefix, Box::new(std::io::stdout()))
  }

  pub fn with_writer(prefix: &str, out: Box<dyn Write + Send>) -> Self {
    Self {
      prefix: prefix.to_string(),
      snapshot: Mutex::new(Vec::new()),
      out: Mutex::new(out),
    }
  }
}

#[async_trait]
impl Subscriber for ConsoleSink {
  fn update(&self, commands: &[Command]) {
    if let Ok(mut snapshot) = self.snapshot.lock() {
      *snapshot = commands.to_vec();
    }
  }

  async fn flush(&self) -> Result<(), SinkError> {
    let line = {
      let snapshot = self
        .snapshot
        .lock()
        .map_err(|_| SinkError::Other("console snapshot poisoned".to_string()))?;
      if snapshot.is_empty() {
        return Ok(());
      }
      format_batch(&self.prefix, &snapshot)
    };

    let mut out = self
      .out
      .lock()
      .map_err(|_| SinkError::Other("console writer poisoned".to_string()))?;
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
  }

  fn name(&self) -> &str {
    "console"
  }
}
