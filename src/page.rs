//! Per-page optimisation: images, then fonts, then dead metadata.
//!
//! Nothing in here fails. Each resource is handled on its own and a broken
//! one is logged and left as it was.

use std::collections::HashSet;

use anyhow::Result;
use log::{debug, warn};
use lopdf::{Document, Object, ObjectId};

use crate::fonts::{self, FontOutcome};
use crate::recompress::{self, RecompressParams};
use crate::resources::{inherited, page_resources, resolve, PageResource};

/// Page dictionary entries that do not affect rendering.
pub const PAGE_METADATA_KEYS: [&[u8]; 4] = [b"Annots", b"Thumb", b"PieceInfo", b"Metadata"];

/// Document information entries blanked before every pass.
pub const DOCUMENT_INFO_KEYS: [&[u8]; 6] = [
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Creator",
    b"Producer",
];

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIDE_PTS: f32 = 792.0;

/// Parameters of one optimisation pass over the whole document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassParams {
    pub image_quality: f32,
    pub image_scale: f32,
    /// Caps image resolution relative to the page's longer side.
    pub max_image_dpi: Option<u32>,
    /// Encode losslessly when `image_quality` is above this.
    pub lossless_above: Option<f32>,
}

impl PassParams {
    pub fn recompress_params(&self, max_dimension: Option<u32>) -> RecompressParams {
        RecompressParams {
            quality: self.image_quality,
            scale: self.image_scale,
            max_dimension,
            lossless: self
                .lossless_above
                .is_some_and(|threshold| self.image_quality > threshold),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageReport {
    pub images_recompressed: usize,
    pub images_kept: usize,
    pub images_failed: usize,
    pub fonts_optimized: usize,
    pub fonts_failed: usize,
    pub metadata_removed: usize,
}

impl PageReport {
    pub fn absorb(&mut self, other: &PageReport) {
        self.images_recompressed += other.images_recompressed;
        self.images_kept += other.images_kept;
        self.images_failed += other.images_failed;
        self.fonts_optimized += other.fonts_optimized;
        self.fonts_failed += other.fonts_failed;
        self.metadata_removed += other.metadata_removed;
    }
}

enum ImageOutcome {
    Replaced { before: usize, after: usize },
    Kept,
}

/// Optimises one page in place.
///
/// `processed` carries object ids already handled in this pass so shared
/// images and fonts are only rewritten once.
pub fn optimize_page(
    doc: &mut Document,
    page_id: ObjectId,
    params: &PassParams,
    processed: &mut HashSet<ObjectId>,
) -> PageReport {
    let mut report = PageReport::default();
    let resources = page_resources(doc, page_id);
    let max_dimension = params
        .max_image_dpi
        .map(|dpi| page_pixel_budget(doc, page_id, dpi));
    let recompress_params = params.recompress_params(max_dimension);

    for resource in resources.iter() {
        let PageResource::Image { name, id } = resource else {
            continue;
        };
        if !processed.insert(*id) {
            continue;
        }
        match optimize_image(doc, *id, &recompress_params) {
            Ok(ImageOutcome::Replaced { before, after }) => {
                debug!("Image {} ({}): {} -> {} bytes", id.0, name, before, after);
                report.images_recompressed += 1;
            }
            Ok(ImageOutcome::Kept) => report.images_kept += 1,
            Err(e) => {
                warn!("Skipping image {} ({}): {:#}", id.0, name, e);
                report.images_failed += 1;
            }
        }
    }

    for resource in resources.iter() {
        let PageResource::Font { name, id } = resource else {
            continue;
        };
        if !processed.insert(*id) {
            continue;
        }
        match fonts::optimize_font(doc, *id) {
            Ok(FontOutcome::Flagged { .. }) => report.fonts_optimized += 1,
            Ok(FontOutcome::NoDescriptor) => {}
            Err(e) => {
                warn!("Skipping font {} ({}): {:#}", id.0, name, e);
                report.fonts_failed += 1;
            }
        }
    }

    report.metadata_removed = strip_page_metadata(doc, page_id);
    report
}

fn optimize_image(
    doc: &mut Document,
    id: ObjectId,
    params: &RecompressParams,
) -> Result<ImageOutcome> {
    recompress::inline_filter_references(doc, id);
    let decoded = recompress::decode_image(doc, id)?;
    let recompressed = recompress::recompress(&decoded.image, params)?;

    // Already-compressed images often come out larger; keep those as they are.
    if recompressed.encoded_len() >= decoded.encoded_len {
        return Ok(ImageOutcome::Kept);
    }
    let (before, after) = (decoded.encoded_len, recompressed.encoded_len());
    let (width, height) = (recompressed.width, recompressed.height);

    if let Some(mask_id) = decoded.soft_mask {
        match recompress::decode_mask(doc, mask_id) {
            Ok((mask, mask_len)) => {
                let bytes = recompress::recompress_mask(&mask, width, height)?;
                if bytes.len() < mask_len {
                    if let Some(Object::Stream(stream)) = doc.objects.get_mut(&mask_id) {
                        recompress::write_mask_stream(stream, bytes, width, height);
                    }
                }
            }
            // The mask keeps its own dimensions, which PDF allows.
            Err(e) => debug!("Soft mask {} left as is: {:#}", mask_id.0, e),
        }
    }

    if let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) {
        recompress::write_image_stream(stream, recompressed);
    }
    Ok(ImageOutcome::Replaced { before, after })
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Longest image side, in pixels, that still reaches `dpi` across the
/// page's longer side.
pub fn page_pixel_budget(doc: &Document, page_id: ObjectId, dpi: u32) -> u32 {
    let longest_pts = inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .and_then(|items| {
            let values: Vec<f32> = items
                .iter()
                .filter_map(|item| resolve(doc, item).and_then(number))
                .collect();
            match values.as_slice() {
                [x1, y1, x2, y2] => Some((x2 - x1).abs().max((y2 - y1).abs())),
                _ => None,
            }
        })
        .filter(|side| *side > 0.0)
        .unwrap_or(DEFAULT_PAGE_SIDE_PTS);
    ((longest_pts / 72.0) * dpi as f32).round().max(1.0) as u32
}

/// Drops annotations, thumbnail, piece info and XMP metadata from the page.
/// Returns how many entries were removed.
pub fn strip_page_metadata(doc: &mut Document, page_id: ObjectId) -> usize {
    let Ok(page) = doc.get_dictionary_mut(page_id) else {
        warn!("Page {} is not a dictionary", page_id.0);
        return 0;
    };
    PAGE_METADATA_KEYS
        .iter()
        .filter(|key| page.remove(key).is_some())
        .count()
}

/// Removes the descriptive fields of the document information dictionary.
pub fn strip_document_info(doc: &mut Document) {
    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let info = match info_id {
        Some(id) => doc.get_dictionary_mut(id).ok(),
        None => doc
            .trailer
            .get_mut(b"Info")
            .ok()
            .and_then(|o| o.as_dict_mut().ok()),
    };
    if let Some(info) = info {
        for key in DOCUMENT_INFO_KEYS {
            info.remove(key);
        }
    }
}
