//! The target-size search.
//!
//! Every attempt is a pure function of the pristine source bytes and a set
//! of [`PassParams`]: it loads a fresh document, rewrites it and hands back
//! the serialised candidate. The loop only decides which parameters to try
//! next and when to stop.

use std::collections::HashSet;
use std::fmt;

use log::{debug, info, warn};
use lopdf::{Document, ObjectId};

use crate::error::{CompressError, Result};
use crate::options::{CompressionRequest, ConvergenceOptions, ExhaustionPolicy};
use crate::page::{self, PageReport, PassParams};
use crate::progress::{Callbacks, Progress};

/// Factor applied to the quality after each missed attempt.
pub const QUALITY_DECAY: f32 = 0.8;

/// Floor parameters of the aggressive fallback pass.
pub const AGGRESSIVE_QUALITY: f32 = 0.1;
pub const AGGRESSIVE_SCALE: f32 = 0.5;
pub const AGGRESSIVE_DPI: u32 = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InProcess,
    ExternalEngine,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::InProcess => f.write_str("in-process"),
            Backend::ExternalEngine => f.write_str("external engine"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub output_bytes: Vec<u8>,
    pub final_size_bytes: u64,
    pub target_size_bytes: u64,
    pub target_reached: bool,
    /// Passes run, including an aggressive fallback pass.
    pub attempts: u32,
    pub backend: Backend,
}

impl CompressionResult {
    pub fn new(output_bytes: Vec<u8>, target_size_bytes: u64, attempts: u32, backend: Backend) -> Self {
        let final_size_bytes = output_bytes.len() as u64;
        Self {
            output_bytes,
            final_size_bytes,
            target_size_bytes,
            target_reached: final_size_bytes <= target_size_bytes,
            attempts,
            backend,
        }
    }
}

/// Quality/scale state of one convergence run.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptState {
    pub current_quality: f32,
    pub current_image_scale: f32,
    pub attempt_index: u32,
    pub max_attempts: u32,
    min_quality: f32,
    image_resolution_multiplier: f32,
}

impl AttemptState {
    pub fn new(options: &ConvergenceOptions) -> Self {
        Self {
            current_quality: 1.0,
            current_image_scale: 1.0,
            attempt_index: 0,
            max_attempts: options.max_attempts,
            min_quality: options.min_quality,
            image_resolution_multiplier: options.image_resolution_multiplier,
        }
    }

    /// Tightens the parameters after a missed attempt.
    pub fn decay(&mut self) {
        self.current_quality = (self.current_quality * QUALITY_DECAY).max(self.min_quality);
        self.current_image_scale *= self.image_resolution_multiplier;
        self.attempt_index += 1;
    }

    pub fn exhausted(&self) -> bool {
        self.attempt_index >= self.max_attempts
    }
}

/// Everything the loop needs, derived once from the request.
#[derive(Debug, Clone)]
pub struct ConvergencePlan {
    pub target_size_bytes: u64,
    pub base_quality: f32,
    pub base_scale: f32,
    pub policy: ExhaustionPolicy,
    pub options: ConvergenceOptions,
}

impl ConvergencePlan {
    pub fn for_request(request: &CompressionRequest, options: &ConvergenceOptions) -> Self {
        Self {
            target_size_bytes: request.target_size_bytes(),
            base_quality: request.base_image_quality(),
            base_scale: request.base_image_scale(),
            policy: options.policy_for(&request.mode),
            options: options.clone(),
        }
    }

    pub fn params_for(&self, state: &AttemptState) -> PassParams {
        PassParams {
            image_quality: (self.base_quality * state.current_quality).clamp(0.01, 1.0),
            image_scale: (self.base_scale * state.current_image_scale).clamp(0.01, 1.0),
            max_image_dpi: None,
            lossless_above: self.options.lossless_above,
        }
    }

    pub fn aggressive_params(&self) -> PassParams {
        PassParams {
            image_quality: AGGRESSIVE_QUALITY,
            image_scale: AGGRESSIVE_SCALE,
            max_image_dpi: Some(AGGRESSIVE_DPI),
            lossless_above: None,
        }
    }
}

/// Runs the bounded search. `attempt` receives the parameters and the
/// 1-based attempt number and returns candidate bytes.
pub fn converge<F>(plan: &ConvergencePlan, mut attempt: F) -> Result<CompressionResult>
where
    F: FnMut(&PassParams, u32) -> Result<Vec<u8>>,
{
    let target = plan.target_size_bytes;
    let mut state = AttemptState::new(&plan.options);
    let mut best_size = u64::MAX;

    while !state.exhausted() {
        let params = plan.params_for(&state);
        let number = state.attempt_index + 1;
        let candidate = attempt(&params, number)?;
        let size = candidate.len() as u64;
        info!(
            "Attempt {}/{}: quality {:.3}, scale {:.3} -> {} bytes (target {})",
            number, state.max_attempts, params.image_quality, params.image_scale, size, target
        );
        if size <= target {
            return Ok(CompressionResult::new(candidate, target, number, Backend::InProcess));
        }
        best_size = best_size.min(size);
        state.decay();
    }

    match plan.policy {
        ExhaustionPolicy::Fail => Err(CompressError::UnreachableTarget {
            target,
            best_size,
            attempts: state.attempt_index,
        }),
        ExhaustionPolicy::AggressiveFallback => {
            warn!(
                "Target {} not reached after {} attempts (best {}); running aggressive pass",
                target, state.attempt_index, best_size
            );
            let number = state.attempt_index + 1;
            let candidate = attempt(&plan.aggressive_params(), number)?;
            Ok(CompressionResult::new(candidate, target, number, Backend::InProcess))
        }
    }
}

fn load_document(bytes: &[u8]) -> Result<Document> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| CompressError::DocumentLoad(e.to_string()))?;
    if doc.is_encrypted() {
        // Owner-password-only files open with the empty password.
        if let Err(e) = doc.decrypt(b"") {
            warn!("Failed to decrypt with empty password: {:?}", e);
        }
    }
    Ok(doc)
}

/// Drops empty streams and unreferenced objects, renumbers,
/// Flate-compresses what is not compressed yet and serialises.
fn save_compacted(doc: &mut Document) -> Result<Vec<u8>> {
    let empty = doc.delete_zero_length_streams();
    if !empty.is_empty() {
        debug!("Deleted {} zero-length streams", empty.len());
    }
    let pruned = doc.prune_objects();
    debug!("Pruned {} unreferenced objects", pruned.len());
    doc.renumber_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| CompressError::Save(e.to_string()))?;
    Ok(buffer)
}

/// One full pass over a fresh copy of `source`.
pub fn run_attempt(
    source: &[u8],
    params: &PassParams,
    callbacks: &mut Callbacks<'_>,
    label: &str,
) -> Result<Vec<u8>> {
    let mut doc = load_document(source)?;
    page::strip_document_info(&mut doc);

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = pages.len();
    let mut processed = HashSet::new();
    let mut summary = PageReport::default();

    for (index, page_id) in pages.into_iter().enumerate() {
        let report = page::optimize_page(&mut doc, page_id, params, &mut processed);
        summary.absorb(&report);
        callbacks.progress(Progress::determinate((index + 1) as f64, total as f64));
        callbacks.status(&format!("{}: processing page {}/{}", label, index + 1, total));
    }
    debug!("{}: {:?}", label, summary);

    save_compacted(&mut doc)
}

/// Compresses `request.source_bytes` in process until the target is met.
///
/// The output is never larger than `request.source_bytes`: a candidate
/// that did not shrink is replaced by the source bytes. A target of at
/// least `source_bytes.len()` is therefore met on the first pass, whatever
/// `original_size_bytes` says.
pub fn compress(
    request: &CompressionRequest,
    options: &ConvergenceOptions,
    callbacks: &mut Callbacks<'_>,
) -> Result<CompressionResult> {
    request.validate()?;
    let page_count = load_document(&request.source_bytes)?.get_pages().len();
    let plan = ConvergencePlan::for_request(request, options);
    info!(
        "Compressing {} bytes ({} pages) with {}: target {} bytes, policy {:?}",
        request.source_bytes.len(),
        page_count,
        request.mode,
        plan.target_size_bytes,
        plan.policy
    );

    let source = request.source_bytes.as_slice();
    let max_attempts = plan.options.max_attempts;
    let result = converge(&plan, |params, number| {
        let label = if number > max_attempts {
            "Aggressive pass".to_string()
        } else {
            format!("Attempt {}/{}", number, max_attempts)
        };
        let candidate = run_attempt(source, params, callbacks, &label)?;
        let candidate = if candidate.len() < source.len() {
            candidate
        } else {
            debug!("{}: no gain over the source, keeping it", label);
            source.to_vec()
        };
        callbacks.status(&format!("{}: {} bytes", label, candidate.len()));
        Ok(candidate)
    })?;

    if result.target_reached {
        callbacks.status(&format!("Done: {} bytes", result.final_size_bytes));
    } else {
        callbacks.status(&format!(
            "Done: {} bytes, target of {} bytes not reached",
            result.final_size_bytes, result.target_size_bytes
        ));
    }
    Ok(result)
}
