//! SessionActor - single-writer task around a [`Session`].
//!
//! The batch engine assumes one producer. When input comes from several
//! tasks, they share a [`SessionHandle`] and the actor serializes their
//! chunks through a bounded channel.
//!
//! # Lifecycle
//!
//! The actor runs until:
//! - [`SessionHandle::shutdown`] is called
//! - The `CancellationToken` is triggered
//! - Every handle has been dropped
//!
//! In all three cases the session is disconnected, which performs the final
//! flush.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{EngineStats, Session};

/// Channel capacity between handles and the actor
const MAILBOX_SIZE: usize = 256;

/// A message sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
  /// Raw input chunk, possibly holding several lines
  Chunk(String),
  /// Disconnect the session and report final stats
  Shutdown { reply: oneshot::Sender<EngineStats> },
}

pub struct SessionActor {
  session: Session,
  rx: mpsc::Receiver<SessionMessage>,
  cancel: CancellationToken,
}

impl SessionActor {
  /// Spawn the actor and return a handle plus the task to await its final stats
  pub fn spawn(session: Session, cancel: CancellationToken) -> (SessionHandle, tokio::task::JoinHandle<EngineStats>) {
    let (tx, rx) = mpsc::channel(MAILBOX_SIZE);
    let actor = Self { session, rx, cancel };
    let task = tokio::spawn(actor.run());
    (SessionHandle::new(tx), task)
  }

  /// Main actor loop
  pub async fn run(mut self) -> EngineStats {
    info!("SessionActor started");

    let reply = loop {
      tokio::select! {
          biased;

          _ = self.cancel.cancelled() => {
              info!("SessionActor shutting down (cancelled)");
              break None;
          }

          msg = self.rx.recv() => {
              match msg {
                  Some(SessionMessage::Chunk(chunk)) => {
                      self.session.receive(&chunk).await;
                  }
                  Some(SessionMessage::Shutdown { reply }) => {
                      info!("SessionActor shutting down (requested)");
                      break Some(reply);
                  }
                  None => {
                      info!("SessionActor shutting down (channel closed)");
                      break None;
                  }
              }
          }
      }
    };

    // Chunks already queued are part of the session's input
    self.rx.close();
    while let Ok(msg) = self.rx.try_recv() {
      if let SessionMessage::Chunk(chunk) = msg {
        self.session.receive(&chunk).await;
      }
    }

    let stats = self.session.disconnect().await;
    debug!(?stats, "SessionActor stopped");
    if let Some(reply) = reply {
      let _ = reply.send(stats);
    }
    stats
  }
}

/// Handle to communicate with a SessionActor
///
/// The handle is cheap to clone and can be shared across tasks.
#[derive(Clone, Debug)]
pub struct SessionHandle {
  tx: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
  pub fn new(tx: mpsc::Sender<SessionMessage>) -> Self {
    Self { tx }
  }

  /// Queue a raw input chunk
  pub async fn send_chunk(&self, chunk: impl Into<String>) -> Result<(), SendError> {
    self
      .tx
      .send(SessionMessage::Chunk(chunk.into()))
      .await
      .map_err(|_| SendError::ActorGone)
  }

  /// Disconnect the session and wait for the final flush
  pub async fn shutdown(&self) -> Result<EngineStats, SendError> {
    let (reply, rx) = oneshot::channel();
    self
      .tx
      .send(SessionMessage::Shutdown { reply })
      .await
      .map_err(|_| SendError::ActorGone)?;
    rx.await.map_err(|_| SendError::ActorGone)
  }
}

/// Error when sending to an actor
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
}
