use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    location::{LocationFeed, LocationUpdate},
    nav_state::{NavState, NavigationUiState},
    place::Place,
    prelude::*,
};

/// Represents a type that can notify the UI that new state is available
pub trait StateUpdateSender {
    fn send_update(&self);
}

/// Struct representing an active navigation flow. Consumes fixes from a
/// [LocationFeed], keeps distance and arrival against the chosen destination
/// up to date, and provides high-level methods for driving the flow.
pub struct NavigationSession<L: LocationFeed, S: StateUpdateSender> {
    state: RwLock<NavState>,
    location: Arc<L>,
    state_updates: S,
    cancel: CancellationToken,
    proceed: CancellationToken,
}

impl<L: LocationFeed, S: StateUpdateSender> NavigationSession<L, S> {
    pub fn new(destination: Option<Place>, location: Arc<L>, state_updates: S) -> Self {
        Self {
            state: RwLock::new(NavState::new(destination)),
            location,
            state_updates,
            cancel: CancellationToken::new(),
            proceed: CancellationToken::new(),
        }
    }

    pub async fn get_ui_state(&self) -> NavigationUiState {
        self.state.read().await.as_ui_state()
    }

    pub async fn choose_destination(&self, place: Place) {
        let mut state = self.state.write().await;
        state.choose_destination(place);
        drop(state);
        self.state_updates.send_update();
    }

    pub async fn clear_destination(&self) {
        let mut state = self.state.write().await;
        state.clear_destination();
        drop(state);
        self.state_updates.send_update();
    }

    pub async fn begin_tracking(&self) {
        let mut state = self.state.write().await;
        state.begin_tracking();
        drop(state);
        self.state_updates.send_update();
    }

    pub async fn stop_tracking(&self) {
        let mut state = self.state.write().await;
        state.stop_tracking();
        drop(state);
        self.state_updates.send_update();
    }

    /// Hand the destination over to the scanning flow. Only honored while
    /// tracking with the arrival threshold met, otherwise nothing happens.
    pub async fn proceed_to_scan(&self) {
        let state = self.state.read().await;
        if state.scan_target().is_some() {
            drop(state);
            self.proceed.cancel();
        }
    }

    pub async fn quit_navigation(&self) {
        self.cancel.cancel();
    }

    /// Main loop of the session, consumes the position feed until the user
    /// quits, proceeds to scanning, or the feed fails.
    ///
    /// Returns the destination when the user proceeds to scanning, [None]
    /// on a plain quit. The feed is torn down on every exit path.
    pub async fn main_loop(&self) -> Result<Option<Place>> {
        let res = 'nav: loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break 'nav Ok(None);
                }

                _ = self.proceed.cancelled() => {
                    let state = self.state.read().await;
                    break 'nav Ok(state.destination().cloned());
                }

                update = self.location.next_update() => {
                    match update {
                        LocationUpdate::Fix(coordinate) => {
                            let mut state = self.state.write().await;
                            state.push_fix(coordinate);
                            drop(state);
                            self.state_updates.send_update();
                        }
                        LocationUpdate::PermissionDenied => {
                            break 'nav Err(anyhow!("Location permission was denied"));
                        }
                        LocationUpdate::Ended => {
                            break 'nav Ok(None);
                        }
                    }
                }
            }
        };

        self.location.stop().await;

        res
    }
}
