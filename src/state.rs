//! Mode state machine
//!
//! [`AppState`] ties the browser to the video player. While a video plays,
//! remote keys are transport commands for the player; otherwise they drive
//! the browser. The input loop is the only writer; the render loop reads the
//! same state under the same lock.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::browser::{BrowserState, ZoomLevel, PAGE_STEP};
use crate::error::BrowseError;
use crate::framebuffer::input::{InputEvent, RemoteKey};
use crate::player::VideoPlayer;

/// Which command set applies to incoming keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Playing,
}

/// Application state
pub struct AppState {
    pub browser: BrowserState,
    player: Box<dyn VideoPlayer>,
}

impl AppState {
    pub fn new(browser: BrowserState, player: Box<dyn VideoPlayer>) -> Self {
        Self { browser, player }
    }

    /// Playback activity as reported by the player.
    pub fn mode(&self) -> Mode {
        if self.player.is_running() {
            Mode::Playing
        } else {
            Mode::Browsing
        }
    }

    pub fn player(&self) -> &dyn VideoPlayer {
        self.player.as_ref()
    }

    /// Apply one key press.
    ///
    /// Player failures are logged and leave the state as it was. The only
    /// error returned is an empty listing, which the caller treats as fatal.
    pub fn handle_key(&mut self, key: RemoteKey) -> Result<(), BrowseError> {
        match self.mode() {
            Mode::Playing => {
                self.handle_playback_key(key);
                Ok(())
            }
            Mode::Browsing => self.handle_browse_key(key),
        }
    }

    fn handle_playback_key(&mut self, key: RemoteKey) {
        let player = &mut self.player;
        let result = match key {
            RemoteKey::Stop => player.stop_video(),
            RemoteKey::VolumeDown => player.volume_down(),
            RemoteKey::VolumeUp => player.volume_up(),
            RemoteKey::ChapterBack => player.back_10min(),
            RemoteKey::ChapterForward => player.forward_10min(),
            RemoteKey::Rewind => player.back_30s(),
            RemoteKey::FastForward => player.forward_30s(),
            RemoteKey::Play | RemoteKey::Pause => player.play_pause(),
            _ => return,
        };

        if let Err(e) = result {
            warn!(key = ?key, error = %e, "Player command failed");
        }
    }

    fn handle_browse_key(&mut self, key: RemoteKey) -> Result<(), BrowseError> {
        self.browser.dirty = true;

        match key {
            RemoteKey::Menu => self.browser.refresh()?,
            RemoteKey::Up => self.browser.move_selection(-1),
            RemoteKey::Down => self.browser.move_selection(1),
            RemoteKey::PageUp => self.browser.move_selection(-PAGE_STEP),
            RemoteKey::PageDown => self.browser.move_selection(PAGE_STEP),
            RemoteKey::Ok => self.open_selected()?,
            RemoteKey::Back => {
                // The parent entry sorts first among directories, so entry 0
                // is taken as the parent without recomputing it.
                if let Some(parent) = self.browser.entries.first().map(|e| e.path.clone()) {
                    self.browser.change_directory(parent)?;
                }
            }
            RemoteKey::Digit1 => self.browser.zoom = ZoomLevel::Small,
            RemoteKey::Digit2 => self.browser.zoom = ZoomLevel::Medium,
            RemoteKey::Digit3 => self.browser.zoom = ZoomLevel::Large,
            _ => self.browser.dirty = false,
        }

        Ok(())
    }

    fn open_selected(&mut self) -> Result<(), BrowseError> {
        let Some(entry) = self.browser.selected().cloned() else {
            return Ok(());
        };

        if entry.is_dir {
            self.browser.change_directory(entry.path)?;
            self.browser.selection = 0;
        } else if let Err(e) = self.player.play_video(&entry.path) {
            warn!(path = %entry.path.display(), error = %e, "Cannot play video");
        }

        Ok(())
    }

    /// Stop playback before the process exits.
    pub fn shutdown(&mut self) {
        if self.player.is_running() {
            if let Err(e) = self.player.stop_video() {
                warn!(error = %e, "Failed to stop playback on shutdown");
            }
        }
    }
}

/// [`AppState`] behind the lock shared by the input and render loops.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<AppState>>,
}

impl SharedState {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Acquire the lock for a full mutation or render pass.
    pub fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Consume input events until shutdown, applying each key under the lock.
///
/// Returns an error only for a fatal listing failure.
pub fn run_input_loop(state: &SharedState, events: Receiver<InputEvent>) -> Result<(), BrowseError> {
    info!("Entering input loop");
    for event in events {
        match event {
            InputEvent::Key(key) => state.with(|app| app.handle_key(key))?,
            InputEvent::Shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{parent_of, Entry};
    use crate::player::{MockCall, MockPlayer, TransportCommand};
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::mpsc;

    const TRANSPORT_KEYS: [RemoteKey; 8] = [
        RemoteKey::Play,
        RemoteKey::Pause,
        RemoteKey::VolumeUp,
        RemoteKey::VolumeDown,
        RemoteKey::Rewind,
        RemoteKey::FastForward,
        RemoteKey::ChapterBack,
        RemoteKey::ChapterForward,
    ];

    fn media_dir() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("movies")).unwrap();
        File::create(temp_dir.path().join("a.mp4")).unwrap();
        File::create(temp_dir.path().join("b.mp4")).unwrap();
        temp_dir
    }

    fn app_in(dir: &Path) -> (AppState, Arc<Mutex<Vec<MockCall>>>) {
        let player = MockPlayer::new();
        let log = player.call_log();
        let mut browser = BrowserState::new(dir);
        browser.refresh().unwrap();
        (AppState::new(browser, Box::new(player)), log)
    }

    fn select(app: &mut AppState, path: &Path) {
        app.browser.selection = app
            .browser
            .entries
            .iter()
            .position(|e| e.path == path)
            .unwrap();
    }

    #[test]
    fn test_navigation_sets_dirty() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());

        app.handle_key(RemoteKey::Down).unwrap();
        assert_eq!(app.browser.selection, 1);
        assert!(app.browser.dirty);
    }

    #[test]
    fn test_unmapped_key_clears_dirty() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        app.browser.dirty = true;

        app.handle_key(RemoteKey::Other).unwrap();
        assert!(!app.browser.dirty);
    }

    #[test]
    fn test_zoom_keys() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());

        app.handle_key(RemoteKey::Digit1).unwrap();
        assert_eq!(app.browser.zoom, ZoomLevel::Small);
        app.handle_key(RemoteKey::Digit3).unwrap();
        assert_eq!(app.browser.zoom, ZoomLevel::Large);
        app.handle_key(RemoteKey::Digit2).unwrap();
        assert_eq!(app.browser.zoom, ZoomLevel::Medium);
    }

    #[test]
    fn test_confirm_on_directory_enters_it() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        let movies = dir.path().join("movies");
        select(&mut app, &movies);

        app.handle_key(RemoteKey::Ok).unwrap();

        assert_eq!(app.browser.working_directory, movies);
        assert_eq!(app.browser.entries, vec![Entry::dir(dir.path())]);
        assert_eq!(app.browser.selection, 0);
        assert_eq!(app.mode(), Mode::Browsing);
    }

    #[test]
    fn test_confirm_on_file_starts_playback() {
        let dir = media_dir();
        let (mut app, log) = app_in(dir.path());
        let video = dir.path().join("b.mp4");
        select(&mut app, &video);

        app.handle_key(RemoteKey::Ok).unwrap();

        assert_eq!(app.mode(), Mode::Playing);
        assert_eq!(*log.lock().unwrap(), vec![MockCall::Play(video)]);
    }

    #[test]
    fn test_play_failure_stays_browsing() {
        let dir = media_dir();
        let mut browser = BrowserState::new(dir.path());
        browser.refresh().unwrap();
        let mut app = AppState::new(browser, Box::new(MockPlayer::failing()));
        let video = dir.path().join("a.mp4");
        select(&mut app, &video);
        let selection = app.browser.selection;

        app.handle_key(RemoteKey::Ok).unwrap();

        assert_eq!(app.mode(), Mode::Browsing);
        assert_eq!(app.browser.selection, selection);
        assert_eq!(app.browser.working_directory, dir.path());
    }

    #[test]
    fn test_transport_keys_ignored_while_browsing() {
        let dir = media_dir();
        let (mut app, log) = app_in(dir.path());

        for key in TRANSPORT_KEYS.into_iter().chain([RemoteKey::Stop]) {
            app.handle_key(key).unwrap();
            assert_eq!(app.mode(), Mode::Browsing);
        }
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transport_keys_forwarded_while_playing() {
        let dir = media_dir();
        let (mut app, log) = app_in(dir.path());
        select(&mut app, &dir.path().join("a.mp4"));
        app.handle_key(RemoteKey::Ok).unwrap();
        log.lock().unwrap().clear();

        for key in TRANSPORT_KEYS {
            app.handle_key(key).unwrap();
        }

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                MockCall::Send(TransportCommand::PlayPause),
                MockCall::Send(TransportCommand::PlayPause),
                MockCall::Send(TransportCommand::VolumeUp),
                MockCall::Send(TransportCommand::VolumeDown),
                MockCall::Send(TransportCommand::Back30s),
                MockCall::Send(TransportCommand::Forward30s),
                MockCall::Send(TransportCommand::Back10Min),
                MockCall::Send(TransportCommand::Forward10Min),
            ]
        );
        assert_eq!(app.mode(), Mode::Playing);
    }

    #[test]
    fn test_failed_transport_stays_playing() {
        let dir = media_dir();
        let player = MockPlayer::failing_transport();
        let log = player.call_log();
        let mut browser = BrowserState::new(dir.path());
        browser.refresh().unwrap();
        let mut app = AppState::new(browser, Box::new(player));
        select(&mut app, &dir.path().join("a.mp4"));
        app.handle_key(RemoteKey::Ok).unwrap();

        for key in TRANSPORT_KEYS {
            app.handle_key(key).unwrap();
            assert_eq!(app.mode(), Mode::Playing);
        }
        assert_eq!(log.lock().unwrap().len(), 1 + TRANSPORT_KEYS.len());

        app.handle_key(RemoteKey::Stop).unwrap();
        assert_eq!(app.mode(), Mode::Browsing);
    }

    #[test]
    fn test_navigation_ignored_while_playing() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        select(&mut app, &dir.path().join("a.mp4"));
        app.handle_key(RemoteKey::Ok).unwrap();
        app.browser.dirty = false;
        let before = app.browser.clone();

        for key in [
            RemoteKey::Up,
            RemoteKey::Down,
            RemoteKey::PageUp,
            RemoteKey::PageDown,
            RemoteKey::Menu,
            RemoteKey::Ok,
            RemoteKey::Back,
            RemoteKey::Digit3,
        ] {
            app.handle_key(key).unwrap();
        }

        assert_eq!(app.browser.selection, before.selection);
        assert_eq!(app.browser.entries, before.entries);
        assert_eq!(app.browser.working_directory, before.working_directory);
        assert_eq!(app.browser.zoom, before.zoom);
        assert!(!app.browser.dirty);
    }

    #[test]
    fn test_stop_returns_to_browsing() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        select(&mut app, &dir.path().join("a.mp4"));
        app.handle_key(RemoteKey::Ok).unwrap();

        app.handle_key(RemoteKey::Stop).unwrap();
        assert_eq!(app.mode(), Mode::Browsing);

        app.handle_key(RemoteKey::Down).unwrap();
        assert!(app.browser.dirty);
    }

    #[test]
    fn test_back_goes_to_parent() {
        let dir = media_dir();
        let movies = dir.path().join("movies");
        let (mut app, _) = app_in(&movies);

        app.handle_key(RemoteKey::Back).unwrap();
        assert_eq!(app.browser.working_directory, dir.path());
    }

    /// "Back" trusts the first entry to be the parent. When a listing puts
    /// something else first, that entry is where "back" goes.
    #[test]
    fn test_back_uses_first_entry_not_real_parent() {
        let dir = media_dir();
        let movies = dir.path().join("movies");
        let (mut app, _) = app_in(dir.path());
        app.browser.entries = vec![Entry::dir(&movies), Entry::dir(parent_of(dir.path()))];

        app.handle_key(RemoteKey::Back).unwrap();
        assert_eq!(app.browser.working_directory, movies);
    }

    #[test]
    fn test_menu_refreshes_listing() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        File::create(dir.path().join("c.mp4")).unwrap();

        app.handle_key(RemoteKey::Menu).unwrap();
        assert!(app.browser.entries.iter().any(|e| e.path == dir.path().join("c.mp4")));
    }

    #[test]
    fn test_input_loop_stops_on_shutdown() {
        let dir = media_dir();
        let (app, _) = app_in(dir.path());
        let shared = SharedState::new(app);
        let (tx, rx) = mpsc::channel();

        tx.send(InputEvent::Key(RemoteKey::Down)).unwrap();
        tx.send(InputEvent::Key(RemoteKey::Down)).unwrap();
        tx.send(InputEvent::Shutdown).unwrap();
        tx.send(InputEvent::Key(RemoteKey::Up)).unwrap();

        run_input_loop(&shared, rx).unwrap();
        assert_eq!(shared.lock().browser.selection, 2);
    }

    #[test]
    fn test_input_loop_ends_when_source_closes() {
        let dir = media_dir();
        let (app, _) = app_in(dir.path());
        let shared = SharedState::new(app);
        let (tx, rx) = mpsc::channel();
        tx.send(InputEvent::Key(RemoteKey::Digit1)).unwrap();
        drop(tx);

        run_input_loop(&shared, rx).unwrap();
        assert_eq!(shared.lock().browser.zoom, ZoomLevel::Small);
    }

    #[test]
    fn test_input_loop_aborts_on_empty_listing() {
        let dir = media_dir();
        let (mut app, _) = app_in(dir.path());
        app.browser = app.browser.clone().with_lister(|_: &Path| Vec::new());
        let shared = SharedState::new(app);
        let (tx, rx) = mpsc::channel();

        tx.send(InputEvent::Key(RemoteKey::Down)).unwrap();
        tx.send(InputEvent::Key(RemoteKey::Menu)).unwrap();
        tx.send(InputEvent::Key(RemoteKey::Down)).unwrap();
        tx.send(InputEvent::Shutdown).unwrap();

        let result = run_input_loop(&shared, rx);

        assert!(matches!(result, Err(BrowseError::EmptyListing { .. })));
        assert!(shared.lock().browser.entries.is_empty());
    }

    #[test]
    fn test_shutdown_stops_playback() {
        let dir = media_dir();
        let (mut app, log) = app_in(dir.path());
        select(&mut app, &dir.path().join("a.mp4"));
        app.handle_key(RemoteKey::Ok).unwrap();

        app.shutdown();
        assert!(!app.player().is_running());
        assert_eq!(log.lock().unwrap().last(), Some(&MockCall::Stop));
    }
}
