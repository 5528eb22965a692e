//! Media Center
//!
//! Directory browser and video launcher driven by an infrared remote,
//! drawn straight to the Linux framebuffer.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use media_center::config::MediaConfig;
use media_center::framebuffer;

fn main() -> Result<()> {
    let config = MediaConfig::load_default();
    init_logging(config.as_ref().map_or("info", |c| c.log_level.as_str()));
    let config = config?;

    framebuffer::run(&config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},media_center={}", level, level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
