//! Display wake signal
//!
//! A six byte escape sequence written to the console terminal brings the
//! attached display out of standby. [`DisplayWake`] sends it at most once
//! per interval.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::debug;

/// `ESC [ 9 ; 0 ]`: disable console blanking.
pub const WAKE_SEQUENCE: [u8; 6] = [0x1B, 0x5B, 0x39, 0x3B, 0x30, 0x5D];

/// Where the wake sequence is written
pub trait WakeChannel: Send {
    fn send_wake(&mut self, sequence: &[u8]) -> io::Result<()>;
}

/// Terminal device, opened write-only for each wake and closed afterwards.
pub struct TtyWake {
    path: PathBuf,
}

impl TtyWake {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WakeChannel for TtyWake {
    fn send_wake(&mut self, sequence: &[u8]) -> io::Result<()> {
        let mut tty = OpenOptions::new().write(true).open(&self.path)?;
        tty.write_all(sequence)
    }
}

/// Rate-limited wake signal
pub struct DisplayWake<W> {
    channel: W,
    interval: Duration,
    next_allowed: Option<Instant>,
}

impl<W: WakeChannel> DisplayWake<W> {
    pub fn new(channel: W, interval: Duration) -> Self {
        Self {
            channel,
            interval,
            next_allowed: None,
        }
    }

    /// Send the wake sequence unless one was sent less than an interval
    /// before `now`. Returns whether a write happened. A failed write does
    /// not start a new interval.
    pub fn wake_at(&mut self, now: Instant) -> io::Result<bool> {
        if self.next_allowed.is_some_and(|next| now < next) {
            return Ok(false);
        }

        self.channel.send_wake(&WAKE_SEQUENCE)?;
        self.next_allowed = Some(now + self.interval);
        debug!("Sent display wake sequence");
        Ok(true)
    }

    pub fn wake(&mut self) -> io::Result<bool> {
        self.wake_at(Instant::now())
    }
}
