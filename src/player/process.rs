//! Process-backed player.
//!
//! Launches `<program> <args...> <path>` (omxplayer by default) and steers it
//! by writing keystrokes to its stdin, the same way a user at a terminal
//! would.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;

use tracing::{debug, info, warn};

use super::{TransportCommand, VideoPlayer};
use crate::error::{PlayerError, PlayerResult};

/// Player that owns one external playback process at a time.
pub struct ProcessPlayer {
    program: String,
    args: Vec<String>,
    running: bool,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl ProcessPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            running: false,
            child: None,
            stdin: None,
        }
    }

    fn write_if_running(&mut self, command: TransportCommand) -> PlayerResult<()> {
        if !self.running {
            return Ok(());
        }
        let stdin = self.stdin.as_mut().ok_or(PlayerError::NotConnected)?;
        stdin
            .write_all(command.control_sequence())
            .and_then(|_| stdin.flush())
            .map_err(PlayerError::Write)?;
        debug!(command = ?command, "Sent player command");
        Ok(())
    }

    /// Close the control stream and hand the process to a background thread
    /// that waits for it to exit.
    fn release_process(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let pid = child.id();
            thread::spawn(move || match child.wait() {
                Ok(status) => info!(pid = pid, status = %status, "Player process exited"),
                Err(e) => warn!(pid = pid, error = %e, "Failed to wait for player process"),
            });
        }
    }
}

/// Forward the player's stdout to the log so the pipe never fills up.
fn drain_output(stdout: ChildStdout) {
    thread::spawn(move || {
        for line in BufReader::new(stdout).split(b'\n') {
            match line {
                Ok(line) => debug!(output = %String::from_utf8_lossy(&line), "Player output"),
                Err(_) => break,
            }
        }
    });
}

impl VideoPlayer for ProcessPlayer {
    fn play_video(&mut self, path: &Path) -> PlayerResult<()> {
        self.stop_video()?;

        info!(program = %self.program, path = %path.display(), "Starting playback");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(PlayerError::MissingPipe("stdout"))?;
        let stdin = child.stdin.take().ok_or(PlayerError::MissingPipe("stdin"))?;
        drain_output(stdout);

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.running = true;
        Ok(())
    }

    fn stop_video(&mut self) -> PlayerResult<()> {
        let result = self.write_if_running(TransportCommand::Quit);
        if self.running {
            info!("Stopping playback");
        }
        self.release_process();
        self.running = false;
        result
    }

    fn send(&mut self, command: TransportCommand) -> PlayerResult<()> {
        self.write_if_running(command)
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for ProcessPlayer {
    fn drop(&mut self) {
        if self.running {
            if let Err(e) = self.stop_video() {
                warn!(error = %e, "Failed to stop player on shutdown");
            }
        }
    }
}
