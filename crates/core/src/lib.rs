//! Batched command processing.
//!
//! Commands arrive one line at a time and accumulate into a batch. A batch
//! closes when it reaches the configured size, or when an explicit block
//! (`{` ... `}` by default) closes. Every closed batch is handed to all
//! registered subscribers, whose flush actions run concurrently.
//!
//! # Layout
//!
//! - [`Command`]: a single timestamped command line
//! - [`BlockTracker`]: nesting depth of block markers, converts them to [`Signal`]s
//! - [`BatchEngine`]: pending buffer, flush policy and subscriber fan-out
//! - [`Session`]: ties a tracker and an engine together and splits raw input
//! - [`SessionActor`] / [`SessionHandle`]: single-writer task for multi-producer use

mod actor;
mod block;
mod command;
mod engine;
mod session;
mod subscriber;

pub mod config;


pub use actor::{SendError, SessionActor, SessionHandle, SessionMessage};
pub use block::{BlockTracker, Signal};
pub use command::Command;
pub use config::Config;
pub use engine::{BatchEngine, EngineConfig, EngineStats, FlushReport};
pub use session::Session;
pub use subscriber::{SinkError, Subscriber};
