use serde::{Deserialize, Serialize};

use crate::{
    location::{self, Coordinate},
    place::Place,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// Which phase of the navigation flow the session is in
pub enum TrackingMode {
    /// No destination chosen yet, the user is browsing the map
    Selecting,
    /// A destination is chosen, waiting for the user to start walking
    Previewing,
    /// Live guidance toward the destination
    Tracking,
}

/// This struct handles all state for an active navigation flow
#[derive(Debug, Clone)]
pub struct NavState {
    mode: TrackingMode,
    destination: Option<Place>,
    /// Latest fix from the position feed, [None] until the first one lands
    position: Option<Coordinate>,
}

impl NavState {
    pub fn new(destination: Option<Place>) -> Self {
        let mode = if destination.is_some() {
            TrackingMode::Previewing
        } else {
            TrackingMode::Selecting
        };

        Self {
            mode,
            destination,
            position: None,
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    pub fn destination(&self) -> Option<&Place> {
        self.destination.as_ref()
    }

    /// Overwrite the last known position. Every fix is trusted as-is, there
    /// is no smoothing or outlier rejection.
    pub fn push_fix(&mut self, coordinate: Coordinate) {
        self.position = Some(coordinate);
    }

    /// Pick (or switch) the destination. Ignored while live tracking is
    /// running.
    pub fn choose_destination(&mut self, place: Place) {
        if self.mode != TrackingMode::Tracking {
            self.destination = Some(place);
            self.mode = TrackingMode::Previewing;
        }
    }

    /// Drop the chosen destination and go back to browsing. Ignored while
    /// live tracking is running.
    pub fn clear_destination(&mut self) {
        if self.mode == TrackingMode::Previewing {
            self.destination = None;
            self.mode = TrackingMode::Selecting;
        }
    }

    /// Start live tracking. Requires a destination and at least one
    /// position fix, otherwise nothing changes.
    pub fn begin_tracking(&mut self) {
        if self.mode == TrackingMode::Previewing && self.position.is_some() {
            self.mode = TrackingMode::Tracking;
        }
    }

    /// Stop live tracking, keeping the destination for another go
    pub fn stop_tracking(&mut self) {
        if self.mode == TrackingMode::Tracking {
            self.mode = TrackingMode::Previewing;
        }
    }

    /// Straight-line distance to the destination, [None] until both a
    /// destination and a position fix exist
    pub fn distance_km(&self) -> Option<f64> {
        match (self.position, &self.destination) {
            (Some(position), Some(place)) => {
                Some(location::distance_km(position, place.coordinate))
            }
            _ => None,
        }
    }

    /// The destination to hand to the scanner, [Some] only while tracking
    /// with the arrival threshold met
    pub fn scan_target(&self) -> Option<&Place> {
        let arrived = self.distance_km().is_some_and(location::within_arrival);
        if self.mode == TrackingMode::Tracking && arrived {
            self.destination()
        } else {
            None
        }
    }

    pub fn as_ui_state(&self) -> NavigationUiState {
        let distance_km = self.distance_km();

        NavigationUiState {
            mode: self.mode,
            destination: self.destination.clone(),
            position: self.position,
            distance_km,
            eta_minutes: distance_km.map(location::walk_eta_minutes),
            arrived: distance_km.is_some_and(location::within_arrival),
        }
    }
}

/// Subset of [NavState] that is meant to be sent to a UI frontend
#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
pub struct NavigationUiState {
    /// Phase the flow is in
    pub mode: TrackingMode,
    /// The chosen destination, if any
    pub destination: Option<Place>,
    /// Latest known user position
    pub position: Option<Coordinate>,
    /// Straight-line distance to the destination in kilometers
    pub distance_km: Option<f64>,
    /// Walking-pace estimate, straight line, no routing
    pub eta_minutes: Option<u32>,
    /// Whether the user is within the arrival threshold of the destination
    pub arrived: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mk_place;

    #[test]
    fn test_initial_mode() {
        let empty = NavState::new(None);
        assert_eq!(empty.mode(), TrackingMode::Selecting);
        assert!(empty.destination().is_none());

        let preselected = NavState::new(Some(mk_place("museo", 10.237, -67.61, "T1")));
        assert_eq!(preselected.mode(), TrackingMode::Previewing);
        assert!(preselected.destination().is_some());
    }

    #[test]
    fn test_choose_and_clear() {
        let mut state = NavState::new(None);

        state.choose_destination(mk_place("museo", 10.237, -67.61, "T1"));
        assert_eq!(state.mode(), TrackingMode::Previewing);

        // Switching while previewing is fine
        state.choose_destination(mk_place("choroni", 10.505, -67.604, "T2"));
        assert_eq!(state.destination().unwrap().id, "choroni");

        state.clear_destination();
        assert_eq!(state.mode(), TrackingMode::Selecting);
        assert!(state.destination().is_none());
    }

    #[test]
    fn test_tracking_requires_fix() {
        let mut state = NavState::new(Some(mk_place("museo", 10.237, -67.61, "T1")));

        state.begin_tracking();
        assert_eq!(state.mode(), TrackingMode::Previewing);

        state.push_fix(Coordinate {
            lat: 10.3,
            long: -67.6,
        });
        state.begin_tracking();
        assert_eq!(state.mode(), TrackingMode::Tracking);
    }

    #[test]
    fn test_tracking_locks_destination() {
        let mut state = NavState::new(Some(mk_place("museo", 10.237, -67.61, "T1")));
        state.push_fix(Coordinate {
            lat: 10.3,
            long: -67.6,
        });
        state.begin_tracking();

        state.choose_destination(mk_place("choroni", 10.505, -67.604, "T2"));
        state.clear_destination();
        assert_eq!(state.destination().unwrap().id, "museo");
        assert_eq!(state.mode(), TrackingMode::Tracking);

        state.stop_tracking();
        assert_eq!(state.mode(), TrackingMode::Previewing);
        assert!(state.destination().is_some());
    }

    #[test]
    fn test_derived_values() {
        let mut state = NavState::new(Some(mk_place("museo", 10.237, -67.61, "T1")));

        let ui = state.as_ui_state();
        assert!(ui.distance_km.is_none());
        assert!(ui.eta_minutes.is_none());
        assert!(!ui.arrived);

        state.push_fix(Coordinate {
            lat: 10.3,
            long: -67.6,
        });

        let ui = state.as_ui_state();
        let distance = ui.distance_km.unwrap();
        assert!(distance > 6.0 && distance < 8.0, "Bad distance {distance}");
        // ~7.1 km at 5 km/h
        assert_eq!(ui.eta_minutes.unwrap(), (distance / 5.0 * 60.0).round() as u32);
        assert!(!ui.arrived);
    }

    #[test]
    fn test_scan_target_gating() {
        let mut state = NavState::new(Some(mk_place("museo", 10.0, -67.0, "T1")));

        // Previewing, even while physically there, hands nothing off
        state.push_fix(Coordinate {
            lat: 10.0001,
            long: -67.00005,
        });
        assert!(state.scan_target().is_none());

        state.begin_tracking();
        assert_eq!(state.scan_target().unwrap().id, "museo");

        // Too far away again
        state.push_fix(Coordinate {
            lat: 10.01,
            long: -67.01,
        });
        assert!(state.scan_target().is_none());
    }
}
