//! Status sink implementations.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::types::StatusEvent;
use crate::orchestrator::JobState;

/// Receives state transitions from the orchestrator.
///
/// `publish` is called while the job lock is held, so it must not block.
/// Events arrive in transition order and are never repeated.
pub trait StatusSink: Send + Sync {
    fn publish(&self, event: StatusEvent);
}

/// Ordered feed for a single observer.
///
/// The observer drains the receiver on its own task, which keeps all reads
/// of the published state on one context.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the observer consumes.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn publish(&self, event: StatusEvent) {
        if self.tx.send(event).is_err() {
            debug!("Status observer dropped, event discarded");
        }
    }
}

/// Fan-out feed for any number of late-joining observers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<StatusEvent>,
}

impl BroadcastSink {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusSink for BroadcastSink {
    fn publish(&self, event: StatusEvent) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(event);
    }
}

/// Writes each transition to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn publish(&self, event: StatusEvent) {
        match &event.state {
            JobState::Failed { reason } => warn!(
                job_id = %event.job_id,
                run = event.run,
                seq = event.sequence,
                "Job failed: {}",
                reason
            ),
            state => info!(
                job_id = %event.job_id,
                run = event.run,
                seq = event.sequence,
                "Job {}",
                state.name()
            ),
        }
    }
}

/// Forwards every event to each inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn StatusSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl StatusSink for FanoutSink {
    fn publish(&self, event: StatusEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.publish(event.clone());
            }
            last.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusDetail;
    use chrono::Utc;
    use std::path::PathBuf;

    fn staged_event(sequence: u64) -> StatusEvent {
        StatusEvent {
            job_id: "job".to_string(),
            run: 1,
            sequence,
            at: Utc::now(),
            state: JobState::Staged,
            detail: StatusDetail::Staged {
                path: PathBuf::from("/tmp/input.mp4"),
                size_bytes: 10,
            },
        }
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::channel();
        for seq in 1..=5 {
            sink.publish(staged_event(seq));
        }
        for seq in 1..=5 {
            assert_eq!(rx.recv().await.unwrap().sequence, seq);
        }
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.publish(staged_event(1));
    }

    #[tokio::test]
    async fn test_broadcast_sink_reaches_all_subscribers() {
        let sink = BroadcastSink::new(8);
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();

        sink.publish(staged_event(3));

        assert_eq!(a.recv().await.unwrap().sequence, 3);
        assert_eq!(b.recv().await.unwrap().sequence, 3);
    }

    #[tokio::test]
    async fn test_fanout_sink_forwards_to_each() {
        let (first, mut rx1) = ChannelSink::channel();
        let (second, mut rx2) = ChannelSink::channel();
        let fanout = FanoutSink::new()
            .with(Arc::new(first))
            .with(Arc::new(LogSink))
            .with(Arc::new(second));
        assert_eq!(fanout.len(), 3);

        fanout.publish(staged_event(4));

        assert_eq!(rx1.recv().await.unwrap().sequence, 4);
        assert_eq!(rx2.recv().await.unwrap().sequence, 4);
    }
}
