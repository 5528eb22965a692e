//! Mock player backend for testing and headless operation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::{TransportCommand, VideoPlayer};
use crate::error::{PlayerError, PlayerResult};

/// A call received by the [`MockPlayer`], recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Play(PathBuf),
    Stop,
    Send(TransportCommand),
}

/// Stand-in player that never spawns a process.
///
/// `play_video` and `stop_video` only flip the running flag, transport
/// commands always succeed. Every call is recorded so tests can check what
/// the state machine forwarded.
pub struct MockPlayer {
    running: bool,
    fail_play: bool,
    fail_transport: bool,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self {
            running: false,
            fail_play: false,
            fail_transport: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock whose `play_video` fails the way a missing player binary does.
    pub fn failing() -> Self {
        Self {
            fail_play: true,
            ..Self::new()
        }
    }

    /// A mock whose transport commands fail the way a write to an exited
    /// player does. Playback still starts and stops normally.
    pub fn failing_transport() -> Self {
        Self {
            fail_transport: true,
            ..Self::new()
        }
    }

    /// Handle to the call log that stays valid after the player is boxed.
    pub fn call_log(&self) -> Arc<Mutex<Vec<MockCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: MockCall) {
        debug!(call = ?call, "Mock player call");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Default for MockPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoPlayer for MockPlayer {
    fn play_video(&mut self, path: &Path) -> PlayerResult<()> {
        self.record(MockCall::Play(path.to_path_buf()));
        if self.fail_play {
            return Err(PlayerError::Spawn {
                program: "mock".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock player refuses to play"),
            });
        }
        info!(path = %path.display(), "Mock playback started");
        self.running = true;
        Ok(())
    }

    fn stop_video(&mut self) -> PlayerResult<()> {
        self.record(MockCall::Stop);
        self.running = false;
        Ok(())
    }

    fn send(&mut self, command: TransportCommand) -> PlayerResult<()> {
        self.record(MockCall::Send(command));
        if self.fail_transport {
            return Err(PlayerError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock player stopped reading",
            )));
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
