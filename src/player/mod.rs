//! Video player abstraction.
//!
//! The state machine drives playback through the [`VideoPlayer`] trait. Two
//! backends exist:
//! - [`ProcessPlayer`] - spawns an external player and steers it with
//!   terminal keystrokes on its stdin
//! - [`MockPlayer`] - spawns nothing, only tracks the running flag; used for
//!   tests and headless operation

mod mock;
mod process;

pub use mock::{MockCall, MockPlayer};
pub use process::ProcessPlayer;

use std::path::Path;

use tracing::info;

use crate::config::{PlayerBackend, PlayerConfig};
use crate::error::PlayerResult;

/// Transport intents understood by the external player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    PlayPause,
    VolumeDown,
    VolumeUp,
    Back30s,
    Forward30s,
    Back10Min,
    Forward10Min,
    Quit,
}

impl TransportCommand {
    /// Keystrokes the player expects on stdin for this command.
    pub fn control_sequence(self) -> &'static [u8] {
        match self {
            TransportCommand::PlayPause => b" ",
            TransportCommand::VolumeDown => b"-",
            TransportCommand::VolumeUp => b"+",
            // Arrow keys: left, right, down, up
            TransportCommand::Back30s => b"\x1b[D",
            TransportCommand::Forward30s => b"\x1b[C",
            TransportCommand::Back10Min => b"\x1b[B",
            TransportCommand::Forward10Min => b"\x1b[A",
            TransportCommand::Quit => b"q",
        }
    }
}

/// Playback control used by the state machine.
///
/// Transport methods are no-ops while nothing is playing. Only
/// [`stop_video`](Self::stop_video) clears the running flag; a failed write
/// leaves it untouched.
pub trait VideoPlayer: Send {
    /// Stop whatever is playing and start `path`.
    fn play_video(&mut self, path: &Path) -> PlayerResult<()>;

    /// Ask the player to quit. Always leaves the player not running.
    fn stop_video(&mut self) -> PlayerResult<()>;

    /// Send one transport command if a video is playing.
    fn send(&mut self, command: TransportCommand) -> PlayerResult<()>;

    fn is_running(&self) -> bool;

    fn play_pause(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::PlayPause)
    }

    fn volume_down(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::VolumeDown)
    }

    fn volume_up(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::VolumeUp)
    }

    fn back_30s(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::Back30s)
    }

    fn forward_30s(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::Forward30s)
    }

    fn back_10min(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::Back10Min)
    }

    fn forward_10min(&mut self) -> PlayerResult<()> {
        self.send(TransportCommand::Forward10Min)
    }
}

/// Build the player selected in the configuration.
pub fn from_config(config: &PlayerConfig) -> Box<dyn VideoPlayer> {
    match config.backend {
        PlayerBackend::Omxplayer => {
            info!(program = %config.program, "Using process player backend");
            Box::new(ProcessPlayer::new(config.program.clone(), config.args.clone()))
        }
        PlayerBackend::Mock => {
            info!("Using mock player backend");
            Box::new(MockPlayer::new())
        }
    }
}
