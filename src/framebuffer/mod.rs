//! Framebuffer Front End
//!
//! Renders the directory browser directly to `/dev/fb0` and reads the
//! infrared remote through evdev.
//!
//! Architecture:
//! - `fb.rs` - Framebuffer device wrapper with a back buffer
//! - `ui.rs` - Entry list drawing, font tiers and palette
//! - `wake.rs` - Rate-limited display wake signal
//! - `render.rs` - Render loop thread
//! - `input.rs` - Remote control input via evdev or raw stdin
//! - `app.rs` - Startup, event loop and shutdown

mod app;
mod fb;
pub mod input;
pub mod render;
pub mod ui;
pub mod wake;

#[cfg(test)]
mod canvas;

pub use app::run;
pub use fb::{Framebuffer, PixelFormat};
