//! Size-targeting PDF compression.
//!
//! Two backends share one request/result model: [`convergence::compress`]
//! rewrites the document in process until it fits a byte budget, and
//! [`engine::GhostscriptEngine`] hands the whole job to an external
//! Ghostscript-compatible binary.

use wasm_bindgen::prelude::*;

pub mod convergence;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod options;
pub mod page;
pub mod progress;
pub mod recompress;
pub mod resources;

#[cfg(test)]
mod fixtures;

pub use convergence::{compress, Backend, CompressionResult};
pub use error::{CompressError, Result};
pub use options::{
    CompressionLevel, CompressionMode, CompressionRequest, ConvergenceOptions, ExhaustionPolicy,
};
pub use progress::{Callbacks, Progress};

/// Browser entry point. `target_size` switches to a custom byte budget,
/// otherwise `level` names the preset.
#[wasm_bindgen]
pub fn compress_pdf(
    input: &[u8],
    level: &str,
    target_size: Option<f64>,
) -> std::result::Result<Vec<u8>, JsError> {
    let mode = match target_size {
        Some(bytes) if bytes >= 1.0 => CompressionMode::Custom {
            target_size_bytes: bytes as u64,
        },
        Some(bytes) => return Err(JsError::new(&format!("Invalid target size: {}", bytes))),
        None => CompressionMode::Preset(level.parse().map_err(|e: String| JsError::new(&e))?),
    };
    let request = CompressionRequest::new(input.to_vec(), mode);
    let result = compress(&request, &ConvergenceOptions::default(), &mut Callbacks::none())
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(result.output_bytes)
}
