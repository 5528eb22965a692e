//! Error types for the media center.
//!
//! Browsing failures that break the listing invariant are fatal and bubble
//! up to `main`. Player failures are reported by the caller and never change
//! the browsing state.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while browsing the filesystem.
#[derive(Error, Debug)]
pub enum BrowseError {
    /// A refresh produced no entries at all, not even the parent entry.
    #[error("Listing of {} is empty, the parent entry is missing", directory.display())]
    EmptyListing { directory: PathBuf },
}

/// Errors raised by a video player backend.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The playback process could not be started.
    #[error("Failed to spawn player '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process started but one of its standard streams was not piped.
    #[error("Player process has no {0} pipe")]
    MissingPipe(&'static str),

    /// A command was issued while the player believes it is running but
    /// holds no control stream.
    #[error("Player control stream is not connected")]
    NotConnected,

    /// Writing a control sequence failed, usually because the process
    /// already exited.
    #[error("Failed to write player control sequence: {0}")]
    Write(#[source] io::Error),
}

/// Result type alias for player operations.
pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
