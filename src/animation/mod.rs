//! Procedural per-frame animators.
//!
//! Each animator owns its small piece of state and is advanced once per frame
//! with the elapsed delta. Missing roles or morph targets make the affected
//! animator a no-op without touching the others.

pub mod blink;
pub mod breathing;
pub mod smile;

pub use blink::Blink;
pub use breathing::Breathing;
pub use smile::Smile;
