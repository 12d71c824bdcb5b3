//! In-process progress bus.
//!
//! Stages publish [`StageEvent`]s; observers subscribe. Publishing with no
//! subscriber, or with a lagging one, never affects the pipeline.

use crate::models::progress::{Stage, StageEvent, StageStatus};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts stage progress to any number of observers.
#[derive(Debug, Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<StageEvent>,
}

impl ProgressBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StageEvent) {
        let _ = self.sender.send(event);
    }

    pub fn executing(&self, stage: Stage, current: usize, total: usize, message: impl Into<String>) {
        self.publish(StageEvent::new(stage, StageStatus::Executing, current, total).with_message(message));
    }

    pub fn complete(&self, stage: Stage, total: usize, message: impl Into<String>) {
        self.publish(StageEvent::new(stage, StageStatus::Complete, total, total).with_message(message));
    }

    pub fn error(&self, stage: Stage, message: impl Into<String>) {
        self.publish(StageEvent::new(stage, StageStatus::Error, 0, 0).with_message(message));
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscriber() {
        let bus = ProgressBus::default();
        bus.executing(Stage::Scan, 1, 0, "scanning");
        bus.complete(Stage::Scan, 3, "done");
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = ProgressBus::default();
        let mut rx = bus.subscribe();

        bus.executing(Stage::Execute, 1, 2, "a");
        bus.complete(Stage::Execute, 2, "b");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, StageStatus::Executing);
        assert_eq!(first.current, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.status, StageStatus::Complete);
        assert_eq!(second.message, "b");
    }
}
