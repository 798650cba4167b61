use std::{marker::PhantomData, sync::Arc, time::Duration};

use log::{error, info, warn};
use paseo_logic::{
    AppPreferences, NavigationSession, Place, PlaceCatalog, ScanSession, StateUpdateSender,
    UnlockLedger,
};
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_specta::Event;
use tokio::sync::RwLock;

use crate::{
    Result, location::TauriLocationFeed, scanner::WebviewScanFeed, store::TauriKeyValueStore,
};

/// The state of the navigation session has changed
#[derive(Serialize, Deserialize, Clone, Default, Debug, specta::Type, tauri_specta::Event)]
pub struct NavigationStateUpdate;

/// The state of the scan session has changed
#[derive(Serialize, Deserialize, Clone, Default, Debug, specta::Type, tauri_specta::Event)]
pub struct ScanStateUpdate;

pub struct TauriStateUpdateSender<E: Clone + Default + Event + Serialize>(
    AppHandle,
    PhantomData<E>,
);

impl<E: Serialize + Clone + Default + Event> TauriStateUpdateSender<E> {
    fn new(app: &AppHandle) -> Self {
        Self(app.clone(), PhantomData)
    }
}

impl<E: Serialize + Clone + Default + Event> StateUpdateSender for TauriStateUpdateSender<E> {
    fn send_update(&self) {
        if let Err(why) = E::default().emit(&self.0) {
            error!("Error sending state update to UI: {why:?}");
        }
    }
}

type Navigation =
    NavigationSession<TauriLocationFeed, TauriStateUpdateSender<NavigationStateUpdate>>;
type Scan =
    ScanSession<WebviewScanFeed, TauriKeyValueStore, TauriStateUpdateSender<ScanStateUpdate>>;

/// Long-lived stores shared by every screen
pub struct AppServices {
    pub ledger: Arc<UnlockLedger<TauriKeyValueStore>>,
    pub catalog: PlaceCatalog<TauriKeyValueStore>,
    pub store: TauriKeyValueStore,
}

impl AppServices {
    pub fn load(app: &AppHandle) -> Self {
        let store = TauriKeyValueStore::new(app.clone());
        Self {
            ledger: Arc::new(UnlockLedger::load(store.clone())),
            catalog: PlaceCatalog::load(store.clone()),
            store,
        }
    }

    pub fn read_preferences(&self) -> AppPreferences {
        paseo_logic::read_preferences(&self.store)
    }

    pub fn write_preferences(&self, prefs: AppPreferences) {
        paseo_logic::write_preferences(&self.store, prefs);
    }
}

pub enum AppState {
    Explore,
    Navigate(Arc<Navigation>),
    Scan(Arc<Scan>, Arc<WebviewScanFeed>),
    Gallery(Place),
}

#[derive(Serialize, Deserialize, specta::Type, Debug, Clone, Eq, PartialEq)]
pub enum AppScreen {
    Explore,
    Navigate,
    Scan,
    Gallery,
}

pub type AppStateHandle = RwLock<AppState>;

/// How often the scan session checks for expired rejection indicators
const SCAN_TICK_RATE: Duration = Duration::from_millis(500);

/// The app is changing screens, contains the screen it's switching to
#[derive(Serialize, Deserialize, Clone, Debug, specta::Type, tauri_specta::Event)]
pub struct ChangeScreen(AppScreen);

fn error_dialog(app: &AppHandle, msg: &str) {
    app.dialog()
        .message(msg)
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}

/// A place together with whether the user has unlocked it
#[derive(Serialize, Deserialize, Clone, Debug, specta::Type)]
pub struct PlaceListing {
    pub place: Place,
    pub unlocked: bool,
}

/// Unlock progress for the profile display
#[derive(Serialize, Deserialize, Clone, Copy, Debug, specta::Type)]
pub struct UnlockProgress {
    pub unlocked: u32,
    pub total: u32,
}

impl AppState {
    /// The screen the UI should be showing for this state
    pub fn screen(&self) -> AppScreen {
        match self {
            AppState::Explore => AppScreen::Explore,
            AppState::Navigate(_session) => AppScreen::Navigate,
            AppState::Scan(_session, _feed) => AppScreen::Scan,
            AppState::Gallery(_place) => AppScreen::Gallery,
        }
    }

    pub async fn start_navigation(&mut self, app: &AppHandle, destination: Option<Place>) {
        if let AppState::Explore = self {
            let location = match TauriLocationFeed::start(app).await {
                Ok(location) => location,
                Err(why) => {
                    error!("Couldn't start the position feed: {why:?}");
                    error_dialog(app, "Please allow location access to navigate to a place");
                    return;
                }
            };
            let state_updates = TauriStateUpdateSender::new(app);
            let session = Arc::new(Navigation::new(destination, location, state_updates));
            *self = AppState::Navigate(session.clone());
            Self::navigation_loop(app.clone(), session);
            Self::emit_screen_change(app, AppScreen::Navigate);
        }
    }

    /// Whether `session` is the navigation session currently on screen
    fn is_current_navigation(&self, session: &Arc<Navigation>) -> bool {
        matches!(self, AppState::Navigate(current) if Arc::ptr_eq(current, session))
    }

    fn navigation_loop(app: AppHandle, session: Arc<Navigation>) {
        tokio::spawn(async move {
            let res = session.main_loop().await;
            let state_handle = app.state::<AppStateHandle>();
            let mut state = state_handle.write().await;
            match res {
                Ok(Some(destination)) => {
                    // The user may have quit while the loop was wrapping up,
                    // a finished session they already left must not hand off
                    if state.is_current_navigation(&session) {
                        info!("Arrived at {}, switching to the scanner", destination.name);
                        state.start_scan(&app, destination).await;
                    }
                }
                Ok(None) => {
                    info!("User left navigation");
                }
                Err(why) => {
                    error!("Navigation Error: {why:?}");
                    error_dialog(&app, &format!("Navigation stopped: {why}"));
                    state.quit_to_explore(app.clone()).await;
                }
            }
        });
    }

    /// Scanning is entered by the user from Explore or by the arrival
    /// handoff while the navigation screen is still up. Anything else must
    /// not reopen the flow.
    fn scan_entry_allowed(from: AppScreen) -> bool {
        matches!(from, AppScreen::Explore | AppScreen::Navigate)
    }

    pub async fn start_scan(&mut self, app: &AppHandle, place: Place) {
        if !Self::scan_entry_allowed(self.screen()) {
            return;
        }

        let services = app.state::<AppServices>();
        let feed = Arc::new(WebviewScanFeed::new());
        let state_updates = TauriStateUpdateSender::new(app);
        let session = Arc::new(Scan::new(
            SCAN_TICK_RATE,
            place,
            feed.clone(),
            services.ledger.clone(),
            state_updates,
        ));
        *self = AppState::Scan(session.clone(), feed);
        Self::scan_loop(app.clone(), session);
        Self::emit_screen_change(app, AppScreen::Scan);
    }

    /// Whether `session` is the scan session currently on screen
    fn is_current_scan(&self, session: &Arc<Scan>) -> bool {
        matches!(self, AppState::Scan(current, _feed) if Arc::ptr_eq(current, session))
    }

    fn scan_loop(app: AppHandle, session: Arc<Scan>) {
        tokio::spawn(async move {
            let res = session.main_loop().await;
            let state_handle = app.state::<AppStateHandle>();
            let mut state = state_handle.write().await;
            match res {
                Ok(Some(place)) => {
                    if state.is_current_scan(&session) {
                        info!("Unlocked {}", place.name);
                        state.open_gallery(&app, place);
                    }
                }
                Ok(None) => {
                    info!("User left the scanner");
                }
                Err(why) => {
                    error!("Scanner Error: {why:?}");
                    error_dialog(&app, &format!("Scanning stopped: {why}"));
                    state.quit_to_explore(app.clone()).await;
                }
            }
        });
    }

    /// The gallery opens from Explore for an already-unlocked place or
    /// from the scanner's successful-unlock handoff.
    fn gallery_entry_allowed(from: AppScreen) -> bool {
        matches!(from, AppScreen::Explore | AppScreen::Scan)
    }

    pub fn open_gallery(&mut self, app: &AppHandle, place: Place) {
        if !Self::gallery_entry_allowed(self.screen()) {
            return;
        }

        *self = AppState::Gallery(place);
        Self::emit_screen_change(app, AppScreen::Gallery);
    }

    pub fn get_navigation(&self) -> Result<Arc<Navigation>> {
        if let AppState::Navigate(session) = self {
            Ok(session.clone())
        } else {
            Err("Not on the navigation screen".to_string())
        }
    }

    pub fn get_scan(&self) -> Result<Arc<Scan>> {
        if let AppState::Scan(session, _feed) = self {
            Ok(session.clone())
        } else {
            Err("Not on the scan screen".to_string())
        }
    }

    pub fn get_scan_feed(&self) -> Result<Arc<WebviewScanFeed>> {
        if let AppState::Scan(_session, feed) = self {
            Ok(feed.clone())
        } else {
            Err("Not on the scan screen".to_string())
        }
    }

    pub fn get_gallery(&self) -> Result<Place> {
        if let AppState::Gallery(place) = self {
            Ok(place.clone())
        } else {
            Err("Not on the gallery screen".to_string())
        }
    }

    fn emit_screen_change(app: &AppHandle, screen: AppScreen) {
        if let Err(why) = ChangeScreen(screen).emit(app) {
            warn!("Error emitting screen change: {why:?}");
        }
    }

    pub async fn quit_to_explore(&mut self, app: AppHandle) {
        match self {
            AppState::Explore => {
                warn!("Already exploring!");
                return;
            }
            AppState::Navigate(session) => session.quit_navigation().await,
            AppState::Scan(session, _feed) => session.quit_scan().await,
            AppState::Gallery(_place) => {}
        }
        *self = AppState::Explore;

        Self::emit_screen_change(&app, AppScreen::Explore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_entry_gating() {
        assert!(AppState::scan_entry_allowed(AppScreen::Explore));
        assert!(AppState::scan_entry_allowed(AppScreen::Navigate));
        // A handoff that lands after the user already left stays dead
        assert!(!AppState::scan_entry_allowed(AppScreen::Scan));
        assert!(!AppState::scan_entry_allowed(AppScreen::Gallery));
    }

    #[test]
    fn test_gallery_entry_gating() {
        assert!(AppState::gallery_entry_allowed(AppScreen::Explore));
        assert!(AppState::gallery_entry_allowed(AppScreen::Scan));
        assert!(!AppState::gallery_entry_allowed(AppScreen::Navigate));
        assert!(!AppState::gallery_entry_allowed(AppScreen::Gallery));
    }
}
