//! Render loop
//!
//! A background thread that wakes on a fixed period, takes the shared lock
//! and redraws the listing only when the browser is dirty.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb888};
use tracing::{debug, info, warn};

use super::fb::Framebuffer;
use super::ui::EntryListRenderer;
use super::wake::{DisplayWake, WakeChannel};
use crate::browser::BrowserState;
use crate::state::SharedState;

/// Draw surface whose contents become visible on [`present`](Self::present)
pub trait FrameSink: DrawTarget<Color = Rgb888> {
    fn present(&mut self);
}

impl FrameSink for Framebuffer {
    fn present(&mut self) {
        Framebuffer::present(self);
    }
}

/// Draws the browser onto a frame sink, waking the display first.
pub struct Renderer<S, W> {
    sink: S,
    ui: EntryListRenderer,
    wake: DisplayWake<W>,
}

impl<S, W> Renderer<S, W>
where
    S: FrameSink,
    S::Error: Debug,
    W: WakeChannel,
{
    pub fn new(sink: S, wake: DisplayWake<W>) -> Self {
        Self {
            sink,
            ui: EntryListRenderer::new(),
            wake,
        }
    }

    /// One render pass. Returns whether a frame was drawn.
    pub fn tick(&mut self, browser: &mut BrowserState) -> bool {
        if !browser.dirty {
            return false;
        }

        if let Err(e) = self.wake.wake() {
            warn!(error = %e, "Failed to wake display");
        }

        if let Err(e) = self.ui.render(&mut self.sink, browser) {
            warn!(error = ?e, "Failed to draw entry list");
        }
        self.sink.present();
        browser.dirty = false;

        debug!(entries = browser.entries.len(), selection = browser.selection, "Frame drawn");
        true
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Spawn the render thread. It runs until `stop` is set and hands the
/// renderer back on join so the display is released by the caller.
pub fn spawn_render_loop<S, W>(
    state: SharedState,
    mut renderer: Renderer<S, W>,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> JoinHandle<Renderer<S, W>>
where
    S: FrameSink + Send + 'static,
    S::Error: Debug,
    W: WakeChannel + 'static,
{
    thread::spawn(move || {
        info!(interval_ms = interval.as_millis() as u64, "Render loop started");
        while !stop.load(Ordering::Relaxed) {
            state.with(|app| renderer.tick(&mut app.browser));
            thread::sleep(interval);
        }
        info!("Render loop stopped");
        renderer
    })
}
