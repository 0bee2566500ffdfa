//! vrm-idle - procedural idle animation for a single VRM avatar
//!
//! Brings a loaded humanoid rig to life without motion capture:
//! - Classifies skeleton joints into semantic roles by name
//! - Applies a configurable static pose (arms down, hands turned in)
//! - Blinks at random intervals and breathes with a slow sine wave
//! - Smiles while the user is typing
//!
//! The crate owns no renderer. It mutates an in-memory [`skeleton::Rig`] once
//! per frame; the host reads the joint transforms and morph weights back.

pub mod animation;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod loader;
pub mod pose;
pub mod skeleton;
pub mod typing;

pub use config::Config;
pub use driver::{Avatar, FrameClock, FrameDriver, FrameSnapshot, LoadState};
pub use error::{Result, VrmIdleError};
pub use typing::TypingSignal;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
