//! Built-in subscribers: print each batch to the console, or write each
//! batch to its own log file.

mod console;
mod file;
mod format;

use std::sync::Arc;

use bulk_core::{Subscriber, config::OutputConfig};

pub use console::ConsoleSink;
pub use file::FileSink;
pub use format::format_batch;

/// Build the sinks enabled in the output config
pub fn from_config(config: &OutputConfig) -> Vec<Arc<dyn Subscriber>> {
  let mut sinks: Vec<Arc<dyn Subscriber>> = Vec::new();
  if config.file {
    sinks.push(Arc::new(FileSink::new(&config.directory, &config.prefix)));
  }
  if config.console {
    sinks.push(Arc::new(ConsoleSink::stdout(&config.prefix)));
  }
  sinks
}
