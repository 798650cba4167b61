use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    ledger::UnlockLedger, navigator::StateUpdateSender, place::Place, prelude::*,
    store::KeyValueStore,
};

/// How long a rejected scan stays visible before the indicator clears
const REJECTION_DISPLAY_TIME: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// Outcome of the most recent scan attempt
pub enum ScanOutcome {
    /// The payload matched and the place is unlocked
    Accepted,
    /// The payload did not match, the user may keep trying
    Rejected,
}

#[derive(Debug, Clone)]
/// A single update from a scanning capability
pub enum ScanUpdate {
    /// The scanner decoded a QR payload
    Decoded(String),
    /// The scanner broke (camera unavailable or similar)
    Failed(String),
    /// The scanner shut down and will produce no more payloads
    Ended,
}

pub trait ScanFeed: Send + Sync {
    /// Wait for the next update from the scanner
    fn next_update(&self) -> impl Future<Output = ScanUpdate>;

    /// Tear the scanner down, releasing the camera
    fn stop(&self) -> impl Future<Output = ()> {
        async {}
    }
}

/// This struct handles all state for an active scan attempt
struct ScanState {
    place: Place,
    attempts: u32,
    accepted: bool,
    rejected_at: Option<Instant>,
}

impl ScanState {
    fn new(place: Place) -> Self {
        Self {
            place,
            attempts: 0,
            accepted: false,
            rejected_at: None,
        }
    }

    fn record_accept(&mut self) {
        self.attempts += 1;
        self.accepted = true;
        self.rejected_at = None;
    }

    fn record_reject(&mut self, now: Instant) {
        self.attempts += 1;
        self.rejected_at = Some(now);
    }

    /// Clear a rejection indicator that has been showing long enough.
    /// Returns whether anything changed.
    fn clear_expired_rejection(&mut self, now: Instant) -> bool {
        let expired = self
            .rejected_at
            .is_some_and(|at| now.duration_since(at) >= REJECTION_DISPLAY_TIME);
        if expired {
            self.rejected_at = None;
        }
        expired
    }

    fn outcome(&self) -> Option<ScanOutcome> {
        if self.accepted {
            Some(ScanOutcome::Accepted)
        } else if self.rejected_at.is_some() {
            Some(ScanOutcome::Rejected)
        } else {
            None
        }
    }

    fn as_ui_state(&self) -> ScanUiState {
        ScanUiState {
            place: self.place.clone(),
            attempts: self.attempts,
            outcome: self.outcome(),
        }
    }
}

/// Subset of the scan state that is meant to be sent to a UI frontend
#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
pub struct ScanUiState {
    /// The place being scanned for
    pub place: Place,
    /// How many payloads have been checked this session
    pub attempts: u32,
    /// Outcome of the latest attempt, [None] once the rejection indicator
    /// has cleared
    pub outcome: Option<ScanOutcome>,
}

/// Struct representing an active scan flow. Matches decoded payloads from a
/// [ScanFeed] against the target place and records the unlock in the
/// [UnlockLedger] on the first match.
pub struct ScanSession<F: ScanFeed, K: KeyValueStore, S: StateUpdateSender> {
    state: Mutex<ScanState>,
    feed: Arc<F>,
    ledger: Arc<UnlockLedger<K>>,
    state_updates: S,
    interval: Duration,
    cancel: CancellationToken,
}

impl<F: ScanFeed, K: KeyValueStore, S: StateUpdateSender> ScanSession<F, K, S> {
    pub fn new(
        interval: Duration,
        place: Place,
        feed: Arc<F>,
        ledger: Arc<UnlockLedger<K>>,
        state_updates: S,
    ) -> Self {
        Self {
            state: Mutex::new(ScanState::new(place)),
            feed,
            ledger,
            state_updates,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    pub async fn get_ui_state(&self) -> ScanUiState {
        self.state.lock().await.as_ui_state()
    }

    pub async fn quit_scan(&self) {
        self.cancel.cancel();
    }

    /// Check one decoded payload, returns whether it unlocked the place
    async fn consume_payload(&self, state: &mut ScanState, decoded: &str) -> bool {
        if state.place.accepts_scan(decoded) {
            state.record_accept();
            self.ledger.unlock(&state.place.id).await;
            true
        } else {
            state.record_reject(Instant::now());
            false
        }
    }

    /// Main loop of the session, consumes decoded payloads until one
    /// matches, the user quits, or the scanner fails. Wrong payloads only
    /// bump the attempt counter, there is no retry limit.
    ///
    /// Returns the unlocked place on a match, [None] on a plain quit. The
    /// scanner is torn down on every exit path.
    pub async fn main_loop(&self) -> Result<Option<Place>> {
        let mut interval = tokio::time::interval(self.interval);

        let res = 'scan: loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break 'scan Ok(None);
                }

                update = self.feed.next_update() => {
                    match update {
                        ScanUpdate::Decoded(decoded) => {
                            let mut state = self.state.lock().await;
                            let unlocked = self.consume_payload(&mut state, &decoded).await;
                            let place = unlocked.then(|| state.place.clone());
                            drop(state);
                            self.state_updates.send_update();
                            if let Some(place) = place {
                                break 'scan Ok(Some(place));
                            }
                        }
                        ScanUpdate::Failed(why) => {
                            break 'scan Err(anyhow!("Scanner failed: {why}"));
                        }
                        ScanUpdate::Ended => {
                            break 'scan Ok(None);
                        }
                    }
                }

                _ = interval.tick() => {
                    let mut state = self.state.lock().await;
                    if state.clear_expired_rejection(Instant::now()) {
                        drop(state);
                        self.state_updates.send_update();
                    }
                }
            }
        };

        self.feed.stop().await;

        res
    }
}
