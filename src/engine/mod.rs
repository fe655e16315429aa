//! Adapter for an external Ghostscript-style compressor.
//!
//! Argument building and status parsing are pure and available on every
//! target; running the process needs `tokio` and is native-only.

pub mod args;
pub mod status;

#[cfg(not(target_arch = "wasm32"))]
mod ghostscript;

pub use args::build_arguments;
pub use status::{StatusThrottle, StatusUpdate, DEDUP_WINDOW};

#[cfg(not(target_arch = "wasm32"))]
pub use ghostscript::{EngineJob, EngineOutcome, GhostscriptEngine, DEFAULT_BINARY};
