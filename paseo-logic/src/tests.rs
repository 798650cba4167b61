//! Common utilities for testing

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use tokio::{
    sync::{Mutex, mpsc},
    task::yield_now,
};

use crate::{
    location::{Coordinate, LocationFeed, LocationUpdate},
    navigator::StateUpdateSender,
    place::Place,
    scan::{ScanFeed, ScanUpdate},
    store::KeyValueStore,
};

type UpdateQueue<T> = (mpsc::Sender<T>, Mutex<mpsc::Receiver<T>>);

fn update_queue<T>() -> UpdateQueue<T> {
    let (tx, rx) = mpsc::channel(20);
    (tx, Mutex::new(rx))
}

pub fn mk_place(id: &str, lat: f64, long: f64, qr_token: &str) -> Place {
    Place {
        id: id.to_string(),
        name: format!("Place {id}"),
        description: String::new(),
        coordinate: Coordinate { lat, long },
        qr_token: qr_token.to_string(),
        content_url: format!("https://example.com/{id}.jpg"),
        qr_image_url: String::new(),
    }
}

/// Position feed driven by hand from tests
pub struct MockLocationFeed {
    queue: UpdateQueue<LocationUpdate>,
}

impl MockLocationFeed {
    pub fn new() -> Self {
        Self {
            queue: update_queue(),
        }
    }

    pub async fn push_fix(&self, lat: f64, long: f64) {
        self.push(LocationUpdate::Fix(Coordinate { lat, long })).await;
    }

    pub async fn deny_permission(&self) {
        self.push(LocationUpdate::PermissionDenied).await;
    }

    pub async fn end(&self) {
        self.push(LocationUpdate::Ended).await;
    }

    /// Whether the consuming session tore this feed down
    pub fn is_stopped(&self) -> bool {
        self.queue.0.is_closed()
    }

    pub async fn wait_for_queue_empty(&self) {
        loop {
            let tx = &self.queue.0;
            if tx.is_closed() || tx.capacity() == tx.max_capacity() {
                break;
            } else {
                yield_now().await;
            }
        }
    }

    async fn push(&self, update: LocationUpdate) {
        self.queue.0.send(update).await.ok();
    }
}

impl LocationFeed for MockLocationFeed {
    async fn next_update(&self) -> LocationUpdate {
        let mut rx = self.queue.1.lock().await;
        rx.recv().await.unwrap_or(LocationUpdate::Ended)
    }

    async fn stop(&self) {
        let mut rx = self.queue.1.lock().await;
        rx.close();
    }
}

/// Scanner feed driven by hand from tests
pub struct MockScanFeed {
    queue: UpdateQueue<ScanUpdate>,
}

impl MockScanFeed {
    pub fn new() -> Self {
        Self {
            queue: update_queue(),
        }
    }

    pub async fn submit(&self, decoded: &str) {
        self.push(ScanUpdate::Decoded(decoded.to_string())).await;
    }

    pub async fn fail(&self, why: &str) {
        self.push(ScanUpdate::Failed(why.to_string())).await;
    }

    /// Whether the consuming session tore this feed down
    pub fn is_stopped(&self) -> bool {
        self.queue.0.is_closed()
    }

    pub async fn wait_for_queue_empty(&self) {
        loop {
            let tx = &self.queue.0;
            if tx.is_closed() || tx.capacity() == tx.max_capacity() {
                break;
            } else {
                yield_now().await;
            }
        }
    }

    async fn push(&self, update: ScanUpdate) {
        self.queue.0.send(update).await.ok();
    }
}

impl ScanFeed for MockScanFeed {
    async fn next_update(&self) -> ScanUpdate {
        let mut rx = self.queue.1.lock().await;
        rx.recv().await.unwrap_or(ScanUpdate::Ended)
    }

    async fn stop(&self) {
        let mut rx = self.queue.1.lock().await;
        rx.close();
    }
}

/// In-memory [KeyValueStore], clones share the same backing map so tests
/// can reload from "disk"
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<StdMutex<HashMap<String, String>>>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.0.lock().unwrap().insert(key.to_string(), value);
    }
}

pub struct DummySender;

impl StateUpdateSender for DummySender {
    fn send_update(&self) {}
}
