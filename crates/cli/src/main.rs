//! bulk - batch commands from stdin and hand each batch to console and file sinks

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use bulk_core::{Config, Session, SessionActor, SessionHandle};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod logging;

use logging::init_logging;

#[derive(Parser)]
#[command(name = "bulk")]
#[command(about = "Group commands from stdin into batches")]
#[command(after_help = "\
EXAMPLES:
  printf 'a\\nb\\nc\\nd\\n' | bulk 3     # bulk: a, b, c / bulk: d
  printf 'a\\n{\\nb\\n}\\n' | bulk 3     # bulk: a / bulk: b
  bulk --print-config > bulk.toml     # Write a config template")]
struct Cli {
  /// Commands per batch (overrides config)
  batch_size: Option<usize>,

  /// Config file (default: ./bulk.toml, then user config)
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Directory for batch log files
  #[arg(short, long, value_name = "DIR")]
  dir: Option<PathBuf>,

  /// Do not print batches to stdout
  #[arg(long)]
  no_console: bool,

  /// Do not write batch log files
  #[arg(long)]
  no_file: bool,

  /// Block open marker
  #[arg(long, value_name = "TOKEN")]
  open: Option<String>,

  /// Block close marker
  #[arg(long, value_name = "TOKEN")]
  close: Option<String>,

  /// Print a config template and exit
  #[arg(long)]
  print_config: bool,
}

impl Cli {
  fn resolve_config(&self) -> Result<Config> {
    let mut config = match &self.config {
      Some(path) => Config::load_from(path)?,
      None => {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Config::load_for_dir(&cwd)
      }
    };

    if let Some(size) = self.batch_size {
      config.batch.size = size;
    }
    if let Some(dir) = &self.dir {
      config.output.directory = dir.clone();
    }
    if self.no_console {
      config.output.console = false;
    }
    if self.no_file {
      config.output.file = false;
    }
    if let Some(open) = &self.open {
      config.markers.open = open.clone();
    }
    if let Some(close) = &self.close {
      config.markers.close = close.clone();
    }
    Ok(config)
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.print_config {
    print!("{}", Config::generate_template());
    return Ok(());
  }

  let config = cli.resolve_config()?;
  init_logging(&config.logging.level);
  debug!(?config, "Configuration loaded");

  run(config).await
}

async fn run(config: Config) -> Result<()> {
  let mut session = Session::from_config(&config);
  for sink in bulk_sinks::from_config(&config.output) {
    session.attach(sink);
  }

  let cancel = CancellationToken::new();
  let (handle, task) = SessionActor::spawn(session, cancel.clone());

  let ctrl_c_cancel = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("Interrupted, flushing");
      ctrl_c_cancel.cancel();
    }
  });

  let reader = BufReader::new(tokio::io::stdin());
  match forward_lines(reader, &handle, &cancel).await {
    Ok(true) => {
      handle.shutdown().await?;
    }
    Ok(false) => {}
    Err(e) => {
      cancel.cancel();
      let _ = task.await;
      return Err(e).context("Failed to read stdin");
    }
  }

  let stats = task.await.context("Session task failed")?;
  info!(
    commands = stats.commands_submitted,
    batches = stats.batches_flushed,
    failures = stats.subscriber_failures,
    "Done"
  );
  Ok(())
}

/// Forward input to the session one line at a time.
///
/// Lines that are not valid UTF-8 are decoded lossily rather than ending the
/// run. Returns `true` at end of input and `false` when cancelled or when the
/// session is gone.
async fn forward_lines<R>(mut reader: R, handle: &SessionHandle, cancel: &CancellationToken) -> io::Result<bool>
where
  R: AsyncBufRead + Unpin,
{
  let mut buf = Vec::new();
  loop {
    buf.clear();
    let read = tokio::select! {
      biased;

      _ = cancel.cancelled() => return Ok(false),
      read = reader.read_until(b'\n', &mut buf) => read?,
    };
    if read == 0 {
      return Ok(true);
    }

    let line = match String::from_utf8(std::mem::take(&mut buf)) {
      Ok(line) => line,
      Err(e) => {
        warn!(bytes = e.as_bytes().len(), "Input line is not valid UTF-8, decoding lossily");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
      }
    };
    if handle.send_chunk(line).await.is_err() {
      return Ok(false);
    }
  }
}
