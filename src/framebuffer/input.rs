//! Remote Control Input
//!
//! Reads key presses from the infrared remote through evdev
//! (`/dev/input/event*`, as exposed by the kernel rc-core drivers).
//! Falls back to raw stdin with a keyboard mapping if no remote is found.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use evdev::{Device, InputEventKind, Key};
use tracing::{debug, error, info, warn};

/// Keys of the remote the media center reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    /// Navigation
    Up,
    Down,
    PageUp,
    PageDown,
    Menu,
    Ok,
    Back,
    /// Transport
    Play,
    Pause,
    Stop,
    VolumeUp,
    VolumeDown,
    Rewind,
    FastForward,
    ChapterBack,
    ChapterForward,
    /// Zoom selectors
    Digit1,
    Digit2,
    Digit3,
    /// Anything else the remote sends
    Other,
}

/// Events delivered to the input loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(RemoteKey),
    /// Stop the media center
    Shutdown,
}

/// Input handler that reads from evdev or stdin
pub struct InputHandler {
    rx: Receiver<InputEvent>,
    _thread: JoinHandle<()>,
}

impl InputHandler {
    /// Create a new input handler
    ///
    /// Uses `device` when given, otherwise looks for a remote control among
    /// the evdev devices and falls back to stdin.
    pub fn new(device: Option<&str>) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let thread = match device {
            Some(path) => {
                let device = Device::open(path)
                    .with_context(|| format!("Failed to open input device: {}", path))?;
                info!(path = %path, name = device.name().unwrap_or("unknown"), "Using configured input device");
                spawn_evdev_reader(device, tx)
            }
            None => match find_remote_device() {
                Some(device) => spawn_evdev_reader(device, tx),
                None => {
                    warn!("No remote control found via evdev, falling back to stdin");
                    spawn_stdin_reader(tx)
                }
            },
        };

        Ok(Self { rx, _thread: thread })
    }

    /// Hand the underlying channel to the input loop. The reader thread
    /// keeps running detached.
    pub fn into_receiver(self) -> Receiver<InputEvent> {
        self.rx
    }
}

/// Find the first evdev device that looks like a media remote
fn find_remote_device() -> Option<Device> {
    let input_dir = Path::new("/dev/input");
    let entries = fs::read_dir(input_dir).ok()?;

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if !name.starts_with("event") {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                let is_remote = device.supported_keys().is_some_and(|keys| {
                    keys.contains(Key::KEY_OK)
                        || keys.contains(Key::KEY_PLAY)
                        || keys.contains(Key::KEY_VOLUMEUP)
                });
                if is_remote {
                    info!(
                        path = %path.display(),
                        name = device.name().unwrap_or("unknown"),
                        "Found remote control device"
                    );
                    return Some(device);
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to open input device");
            }
        }
    }

    None
}

/// Consecutive read errors tolerated before the remote is given up on
const MAX_READ_FAILURES: u32 = 10;

/// What the evdev reader does after a failed read
#[derive(Debug, PartialEq, Eq)]
enum ReadFailure {
    /// The device is unplugged or keeps failing: stop reading
    DeviceGone,
    /// Sleep, then read again
    Retry(Duration),
}

/// Classify the `failures`-th consecutive read error. The retry delay
/// doubles from 100ms up to 3.2s.
fn read_failure_action(error: &io::Error, failures: u32) -> ReadFailure {
    if error.raw_os_error() == Some(libc::ENODEV) || failures >= MAX_READ_FAILURES {
        return ReadFailure::DeviceGone;
    }
    ReadFailure::Retry(Duration::from_millis(100 << failures.saturating_sub(1).min(5)))
}

/// Spawn a thread that reads key presses from an evdev device
fn spawn_evdev_reader(mut device: Device, tx: Sender<InputEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut failures = 0;
        loop {
            match device.fetch_events() {
                Ok(events) => {
                    failures = 0;
                    for event in events {
                        if let InputEventKind::Key(key) = event.kind() {
                            // Key press only, no repeats or releases
                            if event.value() == 1 && tx.send(InputEvent::Key(evdev_key_to_remote(key))).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    match read_failure_action(&e, failures) {
                        ReadFailure::DeviceGone => {
                            error!(error = %e, failures = failures, "Remote control lost, stopping input");
                            let _ = tx.send(InputEvent::Shutdown);
                            return;
                        }
                        ReadFailure::Retry(delay) => {
                            warn!(error = %e, failures = failures, "Error reading evdev events");
                            thread::sleep(delay);
                        }
                    }
                }
            }
        }
    })
}

/// Convert an evdev key to a remote key
fn evdev_key_to_remote(key: Key) -> RemoteKey {
    match key {
        Key::KEY_UP => RemoteKey::Up,
        Key::KEY_DOWN => RemoteKey::Down,
        Key::KEY_CHANNELUP | Key::KEY_PAGEUP => RemoteKey::PageUp,
        Key::KEY_CHANNELDOWN | Key::KEY_PAGEDOWN => RemoteKey::PageDown,
        Key::KEY_MENU | Key::KEY_LEFTMETA => RemoteKey::Menu,
        Key::KEY_OK | Key::KEY_ENTER | Key::KEY_SELECT => RemoteKey::Ok,
        Key::KEY_BACK | Key::KEY_BACKSPACE | Key::KEY_ESC => RemoteKey::Back,
        Key::KEY_PLAY => RemoteKey::Play,
        Key::KEY_PAUSE | Key::KEY_PLAYPAUSE => RemoteKey::Pause,
        Key::KEY_STOP | Key::KEY_STOPCD => RemoteKey::Stop,
        Key::KEY_VOLUMEUP => RemoteKey::VolumeUp,
        Key::KEY_VOLUMEDOWN => RemoteKey::VolumeDown,
        Key::KEY_REWIND => RemoteKey::Rewind,
        Key::KEY_FASTFORWARD => RemoteKey::FastForward,
        Key::KEY_PREVIOUS | Key::KEY_PREVIOUSSONG => RemoteKey::ChapterBack,
        Key::KEY_NEXT | Key::KEY_NEXTSONG => RemoteKey::ChapterForward,
        Key::KEY_1 | Key::KEY_NUMERIC_1 => RemoteKey::Digit1,
        Key::KEY_2 | Key::KEY_NUMERIC_2 => RemoteKey::Digit2,
        Key::KEY_3 | Key::KEY_NUMERIC_3 => RemoteKey::Digit3,
        _ => RemoteKey::Other,
    }
}

/// Spawn a thread that reads from stdin (fallback)
fn spawn_stdin_reader(tx: Sender<InputEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut buffer = [0u8; 8];

        loop {
            match stdin.lock().read(&mut buffer) {
                Ok(0) => {
                    let _ = tx.send(InputEvent::Shutdown);
                    return;
                }
                Ok(n) => {
                    if let Some(event) = parse_stdin_input(&buffer[..n]) {
                        let shutdown = event == InputEvent::Shutdown;
                        if tx.send(event).is_err() || shutdown {
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error reading stdin");
                    thread::sleep(Duration::from_millis(100));
                }
            }
        }
    })
}

/// Parse stdin input bytes to an input event
fn parse_stdin_input(bytes: &[u8]) -> Option<InputEvent> {
    if bytes.is_empty() {
        return None;
    }

    if bytes.len() >= 3 && bytes[0] == 0x1B && bytes[1] == b'[' {
        let key = match &bytes[2..] {
            [b'A', ..] => Some(RemoteKey::Up),
            [b'B', ..] => Some(RemoteKey::Down),
            [b'5', b'~', ..] => Some(RemoteKey::PageUp),
            [b'6', b'~', ..] => Some(RemoteKey::PageDown),
            _ => None,
        };
        return Some(InputEvent::Key(key.unwrap_or(RemoteKey::Other)));
    }

    let key = match bytes[0] {
        0x03 | b'q' => return Some(InputEvent::Shutdown), // Ctrl+C
        0x0D | 0x0A => RemoteKey::Ok,
        0x1B | 0x7F | 0x08 => RemoteKey::Back,
        b'm' => RemoteKey::Menu,
        b'p' => RemoteKey::Play,
        b' ' => RemoteKey::Pause,
        b's' => RemoteKey::Stop,
        b'+' | b'=' => RemoteKey::VolumeUp,
        b'-' => RemoteKey::VolumeDown,
        b',' => RemoteKey::Rewind,
        b'.' => RemoteKey::FastForward,
        b'<' => RemoteKey::ChapterBack,
        b'>' => RemoteKey::ChapterForward,
        b'1' => RemoteKey::Digit1,
        b'2' => RemoteKey::Digit2,
        b'3' => RemoteKey::Digit3,
        _ => RemoteKey::Other,
    };
    Some(InputEvent::Key(key))
}
