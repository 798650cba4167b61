use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use log::warn;
use paseo_logic::{Coordinate, LocationFeed, LocationUpdate, prelude::*};
use tauri::AppHandle;
use tauri_plugin_geolocation::{GeolocationExt, PositionOptions};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

type QueuePair<T> = (mpsc::Sender<T>, Mutex<mpsc::Receiver<T>>);

/// How often the platform is asked for a new position
const POLL_RATE: Duration = Duration::from_secs(1);

const OPTIONS: PositionOptions = PositionOptions {
    enable_high_accuracy: true,
    timeout: 10000, // Unused in our case, set to default
    maximum_age: 2000,
};

/// [LocationFeed] over the platform geolocation API, polled from a
/// background task until stopped.
pub struct TauriLocationFeed {
    queue: QueuePair<LocationUpdate>,
    cancel: CancellationToken,
}

impl TauriLocationFeed {
    /// Ask the platform for one position, then start the polling task. A
    /// failed first read means the user never granted location access, no
    /// feed is started in that case.
    pub async fn start(app: &AppHandle) -> Result<Arc<Self>> {
        let first = current_position(app).context("Location permission was denied")?;

        let (tx, rx) = mpsc::channel(15);
        tx.send(LocationUpdate::Fix(first))
            .await
            .expect("Failed to push to position queue");

        let feed = Arc::new(Self {
            queue: (tx, Mutex::new(rx)),
            cancel: CancellationToken::new(),
        });

        tokio::spawn({
            let feed = feed.clone();
            let app = app.clone();
            async move {
                feed.poll_loop(move || current_position(&app)).await;
            }
        });

        Ok(feed)
    }

    // TODO: Use the plugin's watch_position instead of polling once its
    // channel API can be consumed from Rust
    /// Push a fix from `position` into the queue on every tick until
    /// cancelled. Single reads flake on a moving phone (GPS timeouts), so
    /// a failed read skips the tick and the next one tries again.
    async fn poll_loop(&self, mut position: impl FnMut() -> Result<Coordinate>) {
        let mut interval = tokio::time::interval(POLL_RATE);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break;
                }

                _ = interval.tick() => {
                    match position() {
                        Ok(coordinate) => {
                            self.push(LocationUpdate::Fix(coordinate)).await;
                        }
                        Err(why) => {
                            warn!("Skipping a position read: {why:?}");
                        }
                    }
                }
            }
        }
    }

    async fn push(&self, update: LocationUpdate) {
        self.queue.0.send(update).await.ok();
    }
}

impl LocationFeed for TauriLocationFeed {
    async fn next_update(&self) -> LocationUpdate {
        let mut rx = self.queue.1.lock().await;
        rx.recv().await.unwrap_or(LocationUpdate::Ended)
    }

    async fn stop(&self) {
        self.cancel.cancel();
    }
}

fn current_position(app: &AppHandle) -> Result<Coordinate> {
    let pos = app
        .geolocation()
        .get_current_position(Some(OPTIONS))
        .map_err(|why| anyhow!("{why:?}"))?;

    Ok(Coordinate {
        lat: pos.coords.latitude,
        long: pos.coords.longitude,
    })
}
