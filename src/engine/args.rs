//! Ghostscript argument lists for a compression mode.

use crate::options::{CompressionLevel, CompressionMode};

pub const INPUT_FILE: &str = "input.pdf";
pub const OUTPUT_FILE: &str = "output.pdf";

/// Lowest resolution a custom run is allowed to downsample to.
pub const MIN_CUSTOM_RESOLUTION: u32 = 72;

fn base_arguments() -> Vec<String> {
    [
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        "-dNOPAUSE",
        "-dQUIET",
        "-dBATCH",
        "-dSAFER",
        "-dEmbedAllFonts=true",
        "-dSubsetFonts=true",
        "-dAutoRotatePages=/None",
        "-dDetectDuplicateImages=true",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(format!("-sOutputFile={}", OUTPUT_FILE)))
    .collect()
}

fn toggle(name: &str, on: bool) -> String {
    format!("-d{}={}", name, on)
}

fn preset_arguments(level: CompressionLevel) -> Vec<String> {
    let p = level.profile();
    vec![
        format!("-dColorImageResolution={}", p.image_resolution_dpi),
        format!("-dGrayImageResolution={}", p.image_resolution_dpi),
        format!("-dMonoImageResolution={}", p.image_resolution_dpi),
        "-dColorImageDownsampleType=/Bicubic".to_string(),
        "-dGrayImageDownsampleType=/Bicubic".to_string(),
        "-dMonoImageDownsampleType=/Bicubic".to_string(),
        format!("-dColorImageDownsampleThreshold={}", p.color_image_quality),
        format!("-dGrayImageDownsampleThreshold={}", p.grayscale_image_quality),
        format!("-dMonoImageDownsampleThreshold={}", p.mono_image_quality),
        "-dColorConversionStrategy=/LeaveColorUnchanged".to_string(),
        toggle("CompressPages", p.compress_pages),
        toggle("CompressFonts", p.compress_fonts),
        toggle("DownsampleImages", p.downsample_images),
        "-dAutoFilterColorImages=false".to_string(),
        "-dAutoFilterGrayImages=false".to_string(),
        "-dColorImageFilter=/DCTEncode".to_string(),
        "-dGrayImageFilter=/DCTEncode".to_string(),
        "-dEncodeColorImages=true".to_string(),
        "-dEncodeGrayImages=true".to_string(),
        "-dEncodeMonoImages=true".to_string(),
    ]
}

/// `max(round(300 * sqrt(ratio)), 72)`.
pub fn custom_resolution(ratio: f64) -> u32 {
    ((300.0 * ratio.sqrt()).round() as u32).max(MIN_CUSTOM_RESOLUTION)
}

/// Shared quality/threshold of a custom run: the ratio clamped to `[0.2, 1.0]`.
pub fn custom_quality(ratio: f64) -> f64 {
    ratio.clamp(0.2, 1.0)
}

fn custom_arguments(target_size_bytes: u64, original_size_bytes: u64) -> Vec<String> {
    let ratio = if original_size_bytes == 0 {
        1.0
    } else {
        target_size_bytes as f64 / original_size_bytes as f64
    };
    let resolution = custom_resolution(ratio);
    let quality = custom_quality(ratio);
    vec![
        format!("-dColorImageResolution={}", resolution),
        format!("-dGrayImageResolution={}", resolution),
        format!("-dMonoImageResolution={}", resolution),
        "-dColorImageDownsampleType=/Bicubic".to_string(),
        "-dGrayImageDownsampleType=/Bicubic".to_string(),
        "-dMonoImageDownsampleType=/Bicubic".to_string(),
        format!("-dColorImageDownsampleThreshold={}", quality),
        format!("-dGrayImageDownsampleThreshold={}", quality),
        format!("-dMonoImageDownsampleThreshold={}", quality),
        toggle("CompressPages", true),
        toggle("CompressFonts", true),
        toggle("DownsampleImages", true),
    ]
}

/// Builds the full argument list for one engine run. Pure: the same mode and
/// size always give the same list. The input file comes last.
pub fn build_arguments(mode: &CompressionMode, file_size_bytes: u64) -> Vec<String> {
    let mut args = base_arguments();
    match *mode {
        CompressionMode::Preset(level) => args.extend(preset_arguments(level)),
        CompressionMode::Custom { target_size_bytes } => {
            args.extend(custom_arguments(target_size_bytes, file_size_bytes))
        }
    }
    args.push(INPUT_FILE.to_string());
    args
}
