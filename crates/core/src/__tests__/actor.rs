//! SessionActor tests: multi-producer input and shutdown paths.

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tokio_util::sync::CancellationToken;

  use crate::{
    EngineConfig, SendError, Session, SessionActor,
    __tests__::helpers::{RecordingSubscriber, batch},
    config::MarkerConfig,
  };

  fn spawn_actor(
    batch_size: usize,
    cancel: CancellationToken,
  ) -> (
    crate::SessionHandle,
    tokio::task::JoinHandle<crate::EngineStats>,
    Arc<RecordingSubscriber>,
  ) {
    let recorder = Arc::new(RecordingSubscriber::new("rec"));
    let session =
      Session::new(EngineConfig::new(batch_size), MarkerConfig::default()).with_subscriber(recorder.clone());
    let (handle, task) = SessionActor::spawn(session, cancel);
    (handle, task, recorder)
  }

  #[tokio::test]
  async fn test_shutdown_flushes_remaining() {
    let (handle, task, recorder) = spawn_actor(3, CancellationToken::new());

    handle.send_chunk("a\nb\nc\nd").await.unwrap();
    let stats = handle.shutdown().await.unwrap();

    assert_eq!(stats.batches_flushed, 2);
    assert_eq!(recorder.flushed(), vec![batch(&["a", "b", "c"]), batch(&["d"])]);
    assert_eq!(task.await.unwrap(), stats);

    assert!(matches!(handle.send_chunk("late").await, Err(SendError::ActorGone)));
  }

  #[tokio::test]
  async fn test_cancellation_flushes_remaining() {
    let cancel = CancellationToken::new();
    let (handle, task, recorder) = spawn_actor(10, cancel.clone());

    handle.send_chunk("a").await.unwrap();
    handle.send_chunk("b").await.unwrap();
    cancel.cancel();

    let stats = task.await.unwrap();
    assert_eq!(stats.commands_submitted, 2);
    assert_eq!(recorder.flushed(), vec![batch(&["a", "b"])]);
  }

  #[tokio::test]
  async fn test_dropping_handles_stops_actor() {
    let (handle, task, recorder) = spawn_actor(10, CancellationToken::new());

    let producers: Vec<_> = (0..4)
      .map(|i| {
        let handle = handle.clone();
        tokio::spawn(async move {
          for j in 0..5 {
            handle.send_chunk(format!("p{i}-{j}")).await.unwrap();
          }
        })
      })
      .collect();
    for producer in producers {
      producer.await.unwrap();
    }
    drop(handle);

    let stats = task.await.unwrap();
    assert_eq!(stats.commands_submitted, 20);
    assert_eq!(stats.commands_flushed, 20);
    assert_eq!(recorder.flushed().concat().len(), 20);
  }
}
