//! FileSink - writes each flushed batch into its own log file.
//!
//! Files are named `bulk<seconds>_<suffix>.log`, where `<seconds>` is the
//! Unix time of the first command in the batch and `<suffix>` is random, so
//! batches started within the same second never overwrite each other.

use std::{
  path::{Path, PathBuf},
  sync::Mutex,
};

use async_trait::async_trait;
use bulk_core::{Command, SinkError, Subscriber};
use tracing::trace;

use crate::format::format_batch;

pub struct FileSink {
  directory: PathBuf,
  prefix: String,
  snapshot: Mutex<Vec<Command>>,
}

impl FileSink {
  pub fn new(directory: &Path, prefix: &str) -> Self {
    Self {
      directory: directory.to_path_buf(),
      prefix: prefix.to_string(),
      snapshot: Mutex::new(Vec::new()),
    }
  }

  /// Log file path for a batch whose first command is `first`
  pub fn file_path(&self, first: &Command) -> PathBuf {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    self
      .directory
      .join(format!("bulk{}_{}.log", first.timestamp.timestamp(), &suffix[..8]))
  }
}

#[async_trait]
impl Subscriber for FileSink {
  fn update(&self, commands: &[Command]) {
    if let Ok(mut snapshot) = self.snapshot.lock() {
      *snapshot = commands.to_vec();
    }
  }

  async fn flush(&self) -> Result<(), SinkError> {
    let (path, content) = {
      let snapshot = self
        .snapshot
        .lock()
        .map_err(|_| SinkError::Other("file snapshot poisoned".to_string()))?;
      let Some(first) = snapshot.first() else {
        return Ok(());
      };
      (self.file_path(first), format_batch(&self.prefix, &snapshot))
    };

    tokio::fs::write(&path, content).await?;
    trace!(path = %path.display(), "Wrote batch file");
    Ok(())
  }

  fn name(&self) -> &str {
    "file"
  }
}
