//! Application wiring for the framebuffer front end
//!
//! Opens the display and the remote, lists the start directory, then runs the
//! render thread next to the input loop until shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use embedded_graphics::geometry::OriginDimensions;
use tracing::{error, info};

use super::fb::Framebuffer;
use super::input::InputHandler;
use super::render::{spawn_render_loop, Renderer};
use super::wake::{DisplayWake, TtyWake};
use crate::browser::BrowserState;
use crate::config::MediaConfig;
use crate::player;
use crate::state::{run_input_loop, AppState, SharedState};

/// Run the media center until the input source shuts down
pub fn run(config: &MediaConfig) -> Result<()> {
    info!(start_directory = %config.start_directory.display(), "Starting media center");

    let framebuffer = Framebuffer::new(&config.framebuffer_device)?;
    let size = framebuffer.size();
    info!(width = size.width, height = size.height, "Display ready");

    let input = InputHandler::new(config.input_device.as_deref())?;

    let mut browser = BrowserState::new(&config.start_directory);
    browser.refresh().context("Initial directory listing failed")?;
    browser.dirty = true;

    let state = SharedState::new(AppState::new(browser, player::from_config(&config.player)));

    let wake = DisplayWake::new(TtyWake::new(&config.wake_tty), config.wake_interval());
    let stop = Arc::new(AtomicBool::new(false));
    let render_thread = spawn_render_loop(
        state.clone(),
        Renderer::new(framebuffer, wake),
        config.render_interval(),
        Arc::clone(&stop),
    );

    let result = run_input_loop(&state, input.into_receiver());

    stop.store(true, Ordering::Relaxed);
    match render_thread.join() {
        // Dropping the renderer unmaps the framebuffer
        Ok(renderer) => drop(renderer),
        Err(_) => error!("Render thread panicked"),
    }
    state.with(AppState::shutdown);

    match &result {
        Ok(()) => info!("Media center stopped"),
        Err(e) => error!(error = %e, "Media center aborted"),
    }
    result.map_err(Into::into)
}
