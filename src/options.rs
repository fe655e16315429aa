//! Compression levels, their fixed profiles, and per-request options.

use std::fmt;
use std::str::FromStr;

use crate::error::{CompressError, Result};

/// Named point on the quality/size trade-off curve.
///
/// Variants are declared from most to least aggressive, so the derived
/// ordering matches the profile ordering (`Extreme < ... < Prepress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompressionLevel {
    Extreme,
    High,
    Medium,
    Low,
    Prepress,
}

/// Fixed engine-facing settings for a [`CompressionLevel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionLevelProfile {
    pub image_resolution_dpi: u32,
    pub color_image_quality: f32,
    pub grayscale_image_quality: f32,
    pub mono_image_quality: f32,
    pub compress_pages: bool,
    pub compress_fonts: bool,
    pub downsample_images: bool,
}

const EXTREME_PROFILE: CompressionLevelProfile = CompressionLevelProfile {
    image_resolution_dpi: 72,
    color_image_quality: 0.3,
    grayscale_image_quality: 0.3,
    mono_image_quality: 0.3,
    compress_pages: true,
    compress_fonts: true,
    downsample_images: true,
};

const HIGH_PROFILE: CompressionLevelProfile = CompressionLevelProfile {
    image_resolution_dpi: 100,
    color_image_quality: 0.5,
    grayscale_image_quality: 0.5,
    mono_image_quality: 0.5,
    compress_pages: true,
    compress_fonts: true,
    downsample_images: true,
};

const MEDIUM_PROFILE: CompressionLevelProfile = CompressionLevelProfile {
    image_resolution_dpi: 150,
    color_image_quality: 0.7,
    grayscale_image_quality: 0.7,
    mono_image_quality: 0.7,
    compress_pages: true,
    compress_fonts: true,
    downsample_images: true,
};

const LOW_PROFILE: CompressionLevelProfile = CompressionLevelProfile {
    image_resolution_dpi: 200,
    color_image_quality: 0.8,
    grayscale_image_quality: 0.8,
    mono_image_quality: 0.8,
    compress_pages: true,
    compress_fonts: false,
    downsample_images: true,
};

const PREPRESS_PROFILE: CompressionLevelProfile = CompressionLevelProfile {
    image_resolution_dpi: 300,
    color_image_quality: 1.0,
    grayscale_image_quality: 1.0,
    mono_image_quality: 1.0,
    compress_pages: false,
    compress_fonts: false,
    downsample_images: false,
};

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 5] = [
        CompressionLevel::Extreme,
        CompressionLevel::High,
        CompressionLevel::Medium,
        CompressionLevel::Low,
        CompressionLevel::Prepress,
    ];

    pub fn profile(self) -> &'static CompressionLevelProfile {
        match self {
            CompressionLevel::Extreme => &EXTREME_PROFILE,
            CompressionLevel::High => &HIGH_PROFILE,
            CompressionLevel::Medium => &MEDIUM_PROFILE,
            CompressionLevel::Low => &LOW_PROFILE,
            CompressionLevel::Prepress => &PREPRESS_PROFILE,
        }
    }

    /// Share of the original size a preset run aims for.
    pub fn target_ratio(self) -> f64 {
        match self {
            CompressionLevel::High => 0.2,
            CompressionLevel::Medium => 0.4,
            CompressionLevel::Low => 0.6,
            _ => 0.4,
        }
    }

    /// Base image quality used by the in-process backend.
    pub fn image_quality(self) -> f32 {
        match self {
            CompressionLevel::High => 0.3,
            CompressionLevel::Medium => 0.5,
            CompressionLevel::Low => 0.7,
            _ => 0.5,
        }
    }

    /// Base image scale used by the in-process backend.
    pub fn image_scale(self) -> f32 {
        match self {
            CompressionLevel::High => 0.5,
            CompressionLevel::Medium => 0.7,
            CompressionLevel::Low => 0.9,
            _ => 0.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Extreme => "EXTREME",
            CompressionLevel::High => "HIGH",
            CompressionLevel::Medium => "MEDIUM",
            CompressionLevel::Low => "LOW",
            CompressionLevel::Prepress => "PREPRESS",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CompressionLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown compression level '{}' (expected EXTREME, HIGH, MEDIUM, LOW or PREPRESS)",
                    s
                )
            })
    }
}

/// What drives a request: a named level or an explicit byte budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionMode {
    Preset(CompressionLevel),
    Custom { target_size_bytes: u64 },
}

impl CompressionMode {
    pub fn is_custom(&self) -> bool {
        matches!(self, CompressionMode::Custom { .. })
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMode::Preset(level) => write!(f, "{}", level),
            CompressionMode::Custom { target_size_bytes } => {
                write!(f, "CUSTOM({} bytes)", target_size_bytes)
            }
        }
    }
}

/// One compression request. Consumed by a single run.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub source_bytes: Vec<u8>,
    pub mode: CompressionMode,
    pub original_size_bytes: u64,
}

impl CompressionRequest {
    pub fn new(source_bytes: Vec<u8>, mode: CompressionMode) -> Self {
        let original_size_bytes = source_bytes.len() as u64;
        Self {
            source_bytes,
            mode,
            original_size_bytes,
        }
    }

    pub fn preset(source_bytes: Vec<u8>, level: CompressionLevel) -> Self {
        Self::new(source_bytes, CompressionMode::Preset(level))
    }

    pub fn custom(source_bytes: Vec<u8>, target_size_bytes: u64) -> Self {
        Self::new(source_bytes, CompressionMode::Custom { target_size_bytes })
    }

    /// Overrides the size the ratios and the preset budget are computed
    /// against. Defaults to the length of `source_bytes`.
    ///
    /// Only the parameter derivation sees this value. The no-growth
    /// guarantee of [`crate::convergence::compress`] is measured against
    /// `source_bytes`, so a target at or above `source_bytes.len()` is still
    /// met on the first pass.
    pub fn with_original_size(mut self, original_size_bytes: u64) -> Self {
        self.original_size_bytes = original_size_bytes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.original_size_bytes == 0 {
            return Err(CompressError::InvalidRequest(
                "original size must be greater than zero".to_string(),
            ));
        }
        if let CompressionMode::Custom { target_size_bytes: 0 } = self.mode {
            return Err(CompressError::InvalidRequest(
                "target size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Byte budget the run has to meet.
    pub fn target_size_bytes(&self) -> u64 {
        match self.mode {
            CompressionMode::Custom { target_size_bytes } => target_size_bytes,
            CompressionMode::Preset(level) => {
                (self.original_size_bytes as f64 * level.target_ratio()) as u64
            }
        }
    }

    /// `target / original`, only meaningful in custom mode.
    pub fn size_ratio(&self) -> Option<f64> {
        match self.mode {
            CompressionMode::Custom { target_size_bytes } if self.original_size_bytes > 0 => {
                Some(target_size_bytes as f64 / self.original_size_bytes as f64)
            }
            _ => None,
        }
    }

    /// Image quality the first attempt starts from.
    pub fn base_image_quality(&self) -> f32 {
        match (self.mode, self.size_ratio()) {
            (CompressionMode::Preset(level), _) => level.image_quality(),
            (_, Some(ratio)) => (ratio as f32).clamp(0.1, 1.0),
            _ => 1.0,
        }
    }

    /// Image scale the first attempt starts from.
    pub fn base_image_scale(&self) -> f32 {
        match (self.mode, self.size_ratio()) {
            (CompressionMode::Preset(level), _) => level.image_scale(),
            (_, Some(ratio)) => (ratio.sqrt() as f32).clamp(0.3, 1.0),
            _ => 1.0,
        }
    }
}

/// What the convergence loop does once `max_attempts` passes all missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionPolicy {
    /// Return [`CompressError::UnreachableTarget`].
    Fail,
    /// Run one pass with floor parameters and return it as is.
    AggressiveFallback,
}

impl ExhaustionPolicy {
    /// Preset requests fall back, custom budgets fail loudly.
    pub fn default_for(mode: &CompressionMode) -> Self {
        if mode.is_custom() {
            ExhaustionPolicy::Fail
        } else {
            ExhaustionPolicy::AggressiveFallback
        }
    }
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ExhaustionPolicy::Fail),
            "fallback" | "aggressive" => Ok(ExhaustionPolicy::AggressiveFallback),
            other => Err(format!(
                "unknown exhaustion policy '{}' (expected fail or fallback)",
                other
            )),
        }
    }
}

/// Tuning knobs of the convergence loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceOptions {
    pub max_attempts: u32,
    pub min_quality: f32,
    pub image_resolution_multiplier: f32,
    /// `None` picks [`ExhaustionPolicy::default_for`] the request mode.
    pub exhaustion_policy: Option<ExhaustionPolicy>,
    /// Encode images losslessly when the effective quality exceeds this.
    pub lossless_above: Option<f32>,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_quality: 0.2,
            image_resolution_multiplier: 0.9,
            exhaustion_policy: None,
            lossless_above: None,
        }
    }
}

impl ConvergenceOptions {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_min_quality(mut self, min_quality: f32) -> Self {
        self.min_quality = min_quality.clamp(0.01, 1.0);
        self
    }

    pub fn with_image_resolution_multiplier(mut self, multiplier: f32) -> Self {
        self.image_resolution_multiplier = multiplier.clamp(0.01, 1.0);
        self
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = Some(policy);
        self
    }

    pub fn with_lossless_above(mut self, threshold: f32) -> Self {
        self.lossless_above = Some(threshold);
        self
    }

    pub fn policy_for(&self, mode: &CompressionMode) -> ExhaustionPolicy {
        self.exhaustion_policy
            .unwrap_or_else(|| ExhaustionPolicy::default_for(mode))
    }
}
