use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{CaptureEvent, EventBus};
use crate::error::CaptureResult;

/// Fans every event out to all live subscribers over unbounded channels.
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Default)]
pub struct ChannelEventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<CaptureEvent>>>,
}

impl ChannelEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<CaptureEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(tx);
        rx
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

#[async_trait]
impl EventBus for ChannelEventBus {
    async fn publish(&self, event: CaptureEvent) -> CaptureResult<()> {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        Ok(())
    }
}
