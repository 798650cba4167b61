use paseo_logic::{ScanFeed, ScanUpdate};
use tokio::sync::{Mutex, mpsc};

type QueuePair<T> = (mpsc::Sender<T>, Mutex<mpsc::Receiver<T>>);

/// [ScanFeed] bridging decoded QR payloads out of the webview scanner. The
/// webview owns the camera, this side only ever sees decoded text.
pub struct WebviewScanFeed {
    queue: QueuePair<ScanUpdate>,
}

impl WebviewScanFeed {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(15);
        Self {
            queue: (tx, Mutex::new(rx)),
        }
    }

    /// Queue one decoded payload from the webview
    pub async fn submit(&self, decoded: String) {
        self.queue.0.send(ScanUpdate::Decoded(decoded)).await.ok();
    }

    /// Report that the webview scanner broke (camera unavailable or similar)
    pub async fn report_failure(&self, why: String) {
        self.queue.0.send(ScanUpdate::Failed(why)).await.ok();
    }
}

impl ScanFeed for WebviewScanFeed {
    async fn next_update(&self) -> ScanUpdate {
        let mut rx = self.queue.1.lock().await;
        rx.recv().await.unwrap_or(ScanUpdate::Ended)
    }

    async fn stop(&self) {
        let mut rx = self.queue.1.lock().await;
        rx.close();
    }
}
