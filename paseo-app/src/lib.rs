mod location;
mod scanner;
mod state;
mod store;

use log::LevelFilter;
use paseo_logic::{
    AppPreferences, NavigationUiState, Place, PlaceDraft, ScanUiState, viewable_place,
};
use tauri::{AppHandle, Manager, State};
use tauri_specta::{ErrorHandlingMode, collect_commands, collect_events};
use tokio::sync::RwLock;

use std::result::Result as StdResult;

use crate::state::{
    AppScreen, AppServices, AppState, AppStateHandle, ChangeScreen, NavigationStateUpdate,
    PlaceListing, ScanStateUpdate, UnlockProgress,
};

type Result<T = (), E = String> = StdResult<T, E>;

// == GENERAL / FLOW COMMANDS ==

#[tauri::command]
#[specta::specta]
/// Get the screen the app should currently be on, returns [AppScreen]
async fn get_current_screen(state: State<'_, AppStateHandle>) -> Result<AppScreen> {
    let state = state.read().await;
    Ok(state.screen())
}

#[tauri::command]
#[specta::specta]
/// Leave whatever flow is active and go back to the explore screen
async fn quit_to_explore(app: AppHandle, state: State<'_, AppStateHandle>) -> Result {
    let mut state = state.write().await;
    state.quit_to_explore(app).await;
    Ok(())
}

// == AppState::Explore COMMANDS ==

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Get every place in the catalog along with whether the
/// user has unlocked it
async fn list_places(services: State<'_, AppServices>) -> Result<Vec<PlaceListing>> {
    let unlocked = services.ledger.snapshot().await;
    let places = services.catalog.list().await;
    Ok(places
        .into_iter()
        .map(|place| PlaceListing {
            unlocked: unlocked.contains(&place.id),
            place,
        })
        .collect())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Get how many places have been unlocked so far
async fn get_progress(services: State<'_, AppServices>) -> Result<UnlockProgress> {
    Ok(UnlockProgress {
        unlocked: services.ledger.unlocked_count().await as u32,
        total: services.catalog.len().await as u32,
    })
}

#[tauri::command]
#[specta::specta]
/// Get the user's display preferences
fn get_preferences(services: State<'_, AppServices>) -> Result<AppPreferences> {
    Ok(services.read_preferences())
}

#[tauri::command]
#[specta::specta]
/// Update the user's display preferences and persist them
fn update_preferences(
    new_preferences: AppPreferences,
    services: State<'_, AppServices>,
) -> Result {
    services.write_preferences(new_preferences);
    Ok(())
}

// == AppState::Navigate COMMANDS ==

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Open the navigation flow. Pass a place id to preselect
/// that destination, ids that aren't in the catalog open the destination
/// chooser instead. This triggers a screen change to [AppScreen::Navigate]
async fn start_navigation(
    place_id: Option<String>,
    app: AppHandle,
    state: State<'_, AppStateHandle>,
    services: State<'_, AppServices>,
) -> Result {
    let destination = match place_id {
        Some(id) => services.catalog.get(&id).await,
        None => None,
    };
    let mut state = state.write().await;
    state.start_navigation(&app, destination).await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Get the current state of the navigation session, call
/// after receiving an update event
async fn get_navigation_state(state: State<'_, AppStateHandle>) -> Result<NavigationUiState> {
    let session = state.read().await.get_navigation()?;
    Ok(session.get_ui_state().await)
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Choose the destination to navigate to, ids that
/// aren't in the catalog are ignored
async fn choose_destination(
    place_id: String,
    state: State<'_, AppStateHandle>,
    services: State<'_, AppServices>,
) -> Result {
    let session = state.read().await.get_navigation()?;
    if let Some(place) = services.catalog.get(&place_id).await {
        session.choose_destination(place).await;
    }
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Start live tracking toward the chosen destination.
/// Does nothing until the first position fix has arrived
async fn begin_tracking(state: State<'_, AppStateHandle>) -> Result {
    let session = state.read().await.get_navigation()?;
    session.begin_tracking().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Stop live tracking, keeping the destination
async fn stop_tracking(state: State<'_, AppStateHandle>) -> Result {
    let session = state.read().await.get_navigation()?;
    session.stop_tracking().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Drop the chosen destination and go back to the chooser
async fn clear_destination(state: State<'_, AppStateHandle>) -> Result {
    let session = state.read().await.get_navigation()?;
    session.clear_destination().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Navigate) Move on to scanning the destination's QR code, only
/// honored once arrived. This triggers a screen change to [AppScreen::Scan]
async fn proceed_to_scan(state: State<'_, AppStateHandle>) -> Result {
    let session = state.read().await.get_navigation()?;
    session.proceed_to_scan().await;
    Ok(())
}

// AppState::Scan COMMANDS

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Jump straight to scanning a locked place, ids that
/// aren't in the catalog are ignored. This triggers a screen change to
/// [AppScreen::Scan]
async fn start_scan(
    place_id: String,
    app: AppHandle,
    state: State<'_, AppStateHandle>,
    services: State<'_, AppServices>,
) -> Result {
    let Some(place) = services.catalog.get(&place_id).await else {
        return Ok(());
    };
    let mut state = state.write().await;
    state.start_scan(&app, place).await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Scan) Get the current state of the scan session, call after
/// receiving an update event
async fn get_scan_state(state: State<'_, AppStateHandle>) -> Result<ScanUiState> {
    let session = state.read().await.get_scan()?;
    Ok(session.get_ui_state().await)
}

#[tauri::command]
#[specta::specta]
/// (Screen: Scan) Feed one decoded QR payload from the webview scanner into
/// the running session
async fn submit_scan(decoded_text: String, state: State<'_, AppStateHandle>) -> Result {
    let feed = state.read().await.get_scan_feed()?;
    feed.submit(decoded_text).await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Scan) Report that the webview scanner failed, this ends the
/// scan session
async fn report_scan_error(message: String, state: State<'_, AppStateHandle>) -> Result {
    let feed = state.read().await.get_scan_feed()?;
    feed.report_failure(message).await;
    Ok(())
}

// AppState::Gallery COMMANDS

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) View the content of an unlocked place. Locked or
/// unknown places are ignored. This triggers a screen change to
/// [AppScreen::Gallery]
async fn open_gallery(
    place_id: String,
    app: AppHandle,
    state: State<'_, AppStateHandle>,
    services: State<'_, AppServices>,
) -> Result {
    let Some(place) = viewable_place(&services.catalog, &services.ledger, &place_id).await else {
        return Ok(());
    };
    let mut state = state.write().await;
    state.open_gallery(&app, place);
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// (Screen: Gallery) Get the place whose content is being viewed
async fn get_gallery_place(state: State<'_, AppStateHandle>) -> Result<Place> {
    state.read().await.get_gallery()
}

// == ADMIN COMMANDS ==

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Add a new place to the catalog, generating its id,
/// unlock code, and QR image. Returns the created place
async fn admin_add_place(draft: PlaceDraft, services: State<'_, AppServices>) -> Result<Place> {
    Ok(services.catalog.add(draft).await)
}

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Update an existing place, keeping its unlock code so
/// printed QR codes stay valid. Returns the updated place, or null for
/// unknown ids
async fn admin_update_place(
    place_id: String,
    draft: PlaceDraft,
    services: State<'_, AppServices>,
) -> Result<Option<Place>> {
    Ok(services.catalog.update(&place_id, draft).await)
}

#[tauri::command]
#[specta::specta]
/// (Screen: Explore) Delete a place from the catalog, unknown ids do nothing
async fn admin_delete_place(place_id: String, services: State<'_, AppServices>) -> Result {
    services.catalog.delete(&place_id).await;
    Ok(())
}

pub fn mk_specta() -> tauri_specta::Builder {
    tauri_specta::Builder::<tauri::Wry>::new()
        .error_handling(ErrorHandlingMode::Throw)
        .commands(collect_commands![
            get_current_screen,
            quit_to_explore,
            list_places,
            get_progress,
            get_preferences,
            update_preferences,
            start_navigation,
            get_navigation_state,
            choose_destination,
            begin_tracking,
            stop_tracking,
            clear_destination,
            proceed_to_scan,
            start_scan,
            get_scan_state,
            submit_scan,
            report_scan_error,
            open_gallery,
            get_gallery_place,
            admin_add_place,
            admin_update_place,
            admin_delete_place,
        ])
        .events(collect_events![
            ChangeScreen,
            NavigationStateUpdate,
            ScanStateUpdate
        ])
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let state = RwLock::new(AppState::Explore);

    let builder = mk_specta();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(LevelFilter::Debug)
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_geolocation::init())
        .plugin(tauri_plugin_store::Builder::default().build())
        .invoke_handler(builder.invoke_handler())
        .manage(state)
        .setup(move |app| {
            builder.mount_events(app);

            app.manage(AppServices::load(app.handle()));
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
