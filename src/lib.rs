//! Remote-controlled media center for single-board devices.
//!
//! Browses the filesystem on a framebuffer display and hands videos to an
//! external player that is steered over its stdin.

pub mod browser;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod listing;
pub mod player;
pub mod state;
