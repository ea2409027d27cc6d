//! Single-writer, multi-reader slot holding the most recent landmark frame.

use tokio::sync::watch;

use crate::types::LandmarkFrame;

/// Owned by the capture controller; the only writer.
#[derive(Debug)]
pub struct LatestFrameWriter {
    tx: watch::Sender<Option<LandmarkFrame>>,
}

/// Cheap to clone; every clone observes the same slot.
#[derive(Debug, Clone)]
pub struct LatestFrameReader {
    rx: watch::Receiver<Option<LandmarkFrame>>,
}

pub fn latest_frame_slot() -> (LatestFrameWriter, LatestFrameReader) {
    let (tx, rx) = watch::channel(None);
    (LatestFrameWriter { tx }, LatestFrameReader { rx })
}

impl LatestFrameWriter {
    /// `None` means no hand is currently detected.
    pub fn publish(&self, frame: Option<LandmarkFrame>) {
        // Stays writable even with no readers left.
        self.tx.send_replace(frame);
    }

    pub fn reader(&self) -> LatestFrameReader {
        LatestFrameReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl LatestFrameReader {
    pub fn latest(&self) -> Option<LandmarkFrame> {
        self.rx.borrow().clone()
    }

    /// Waits for the next write. Returns `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
