mod catalog;
mod gallery;
mod ledger;
mod location;
mod nav_state;
mod navigator;
mod place;
mod preferences;
mod scan;
mod store;
#[cfg(test)]
mod tests;

pub use catalog::PlaceCatalog;
pub use gallery::viewable_place;
pub use ledger::UnlockLedger;
pub use location::{Coordinate, LocationFeed, LocationUpdate};
pub use nav_state::{NavigationUiState, TrackingMode};
pub use navigator::{NavigationSession, StateUpdateSender};
pub use place::{Place, PlaceDraft};
pub use preferences::{AppPreferences, read_preferences, write_preferences};
pub use scan::{ScanFeed, ScanOutcome, ScanSession, ScanUiState, ScanUpdate};
pub use store::KeyValueStore;

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;

    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;

    pub use anyhow::Context;
}
