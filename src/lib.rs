//! Keyboard-driven playback surface for media pages served under `/files/`.
//!
//! The page location is resolved to a media path, classified into a source
//! descriptor, and handed to the embedded player. Arrow keys, space and `f`
//! then drive the player while a small label flashes seek feedback.

pub mod classify;
pub mod config;
pub mod feedback;
pub mod input;
pub mod path;
pub mod player;
pub mod serving;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::MediaSourceDescriptor;
pub use config::Config;
pub use session::{PageHost, Session};
