//! Browser state shared between the input loop and the render loop.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::BrowseError;
use crate::listing::{list_directory, Entry};

/// Number of rows skipped by the page keys.
pub const PAGE_STEP: isize = 10;

/// Text size tier selected with the numeric keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZoomLevel {
    Small,
    #[default]
    Medium,
    Large,
}

/// Produces the entries of one directory.
pub type Lister = fn(&Path) -> Vec<Entry>;

/// What the browser shows and whether it needs to be drawn again.
#[derive(Clone)]
pub struct BrowserState {
    pub working_directory: PathBuf,
    pub entries: Vec<Entry>,
    pub selection: usize,
    pub zoom: ZoomLevel,
    pub dirty: bool,
    lister: Lister,
}

impl BrowserState {
    /// Create an empty browser rooted at `working_directory`. Nothing is
    /// listed until the first [`refresh`](Self::refresh).
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            entries: Vec::new(),
            selection: 0,
            zoom: ZoomLevel::default(),
            dirty: false,
            lister: list_directory,
        }
    }

    /// Replace [`list_directory`] as the source of entries.
    pub fn with_lister(mut self, lister: Lister) -> Self {
        self.lister = lister;
        self
    }

    /// Re-list the working directory and clamp the selection into range.
    pub fn refresh(&mut self) -> Result<(), BrowseError> {
        self.entries = (self.lister)(&self.working_directory);
        if self.entries.is_empty() {
            return Err(BrowseError::EmptyListing {
                directory: self.working_directory.clone(),
            });
        }
        self.clamp_selection();
        debug!(
            directory = %self.working_directory.display(),
            entries = self.entries.len(),
            "Refreshed working directory"
        );
        Ok(())
    }

    /// Switch to `directory` and list it.
    pub fn change_directory(&mut self, directory: impl Into<PathBuf>) -> Result<(), BrowseError> {
        self.working_directory = directory.into();
        self.refresh()
    }

    /// Move the selection by `delta` rows, stopping at the first and last row.
    pub fn move_selection(&mut self, delta: isize) {
        if self.entries.is_empty() {
            self.selection = 0;
            return;
        }
        let last = self.entries.len() as isize - 1;
        self.selection = (self.selection as isize + delta).clamp(0, last) as usize;
    }

    pub fn clamp_selection(&mut self) {
        self.move_selection(0);
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.entries.get(self.selection)
    }
}

impl fmt::Debug for BrowserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserState")
            .field("working_directory", &self.working_directory)
            .field("entries", &self.entries)
            .field("selection", &self.selection)
            .field("zoom", &self.zoom)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser_with(count: usize) -> BrowserState {
        let mut browser = BrowserState::new("/media");
        browser.entries = (0..count)
            .map(|i| Entry::file(format!("/media/{:02}.mkv", i)))
            .collect();
        browser
    }

    #[test]
    fn test_single_steps_clamp_at_both_ends() {
        let mut browser = browser_with(3);

        browser.move_selection(-1);
        assert_eq!(browser.selection, 0);

        browser.move_selection(1);
        browser.move_selection(1);
        browser.move_selection(1);
        assert_eq!(browser.selection, 2);
    }

    #[test]
    fn test_page_steps_clamp() {
        let mut browser = browser_with(25);

        browser.move_selection(PAGE_STEP);
        assert_eq!(browser.selection, 10);
        browser.move_selection(PAGE_STEP);
        browser.move_selection(PAGE_STEP);
        assert_eq!(browser.selection, 24);
        browser.move_selection(-PAGE_STEP);
        assert_eq!(browser.selection, 14);
        browser.move_selection(-PAGE_STEP * 3);
        assert_eq!(browser.selection, 0);
    }

    #[test]
    fn test_selection_stays_in_range_for_any_sequence() {
        let moves = [1, -1, PAGE_STEP, -PAGE_STEP, 1, 1, PAGE_STEP, -1, -PAGE_STEP, -PAGE_STEP];
        for len in 1..=30 {
            let mut browser = browser_with(len);
            for (i, delta) in moves.iter().cycle().take(60).enumerate() {
                browser.move_selection(*delta * if i % 7 == 0 { 3 } else { 1 });
                assert!(browser.selection < len, "selection {} out of range for {}", browser.selection, len);
            }
        }
    }

    #[test]
    fn test_refresh_clamps_stale_selection() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::File::create(temp_dir.path().join("only.mp4")).unwrap();

        let mut browser = BrowserState::new(temp_dir.path());
        browser.selection = 40;
        browser.refresh().unwrap();

        assert_eq!(browser.entries.len(), 2);
        assert_eq!(browser.selection, 1);
    }

    #[test]
    fn test_empty_listing_is_an_error() {
        let mut browser = BrowserState::new("/mnt").with_lister(|_: &Path| Vec::new());
        browser.selection = 3;

        let result = browser.refresh();

        assert!(matches!(result, Err(BrowseError::EmptyListing { directory }) if directory == Path::new("/mnt")));
        assert!(browser.entries.is_empty());
    }

    #[test]
    fn test_empty_browser_selection_is_zero() {
        let mut browser = browser_with(0);
        browser.move_selection(5);
        assert_eq!(browser.selection, 0);
        assert!(browser.selected().is_none());
    }
}
