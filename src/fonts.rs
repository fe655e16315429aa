use std::io::Write;

use anyhow::{bail, Context, Result};
use lopdf::{Document, Object, ObjectId};

use crate::resources::resolve;

/// Descriptor flag bit set on every font that passes through here.
pub const SUBSET_FLAG: i64 = 32;

const FONT_PROGRAM_KEYS: [&[u8]; 3] = [b"FontFile", b"FontFile2", b"FontFile3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontOutcome {
    /// Standard 14 font or otherwise no descriptor to touch.
    NoDescriptor,
    Flagged { program_compressed: bool },
}

/// Finds the descriptor of a simple font, or of the first descendant of a
/// Type0 font.
fn descriptor_id(doc: &Document, font_id: ObjectId) -> Option<ObjectId> {
    let font = doc.get_dictionary(font_id).ok()?;
    if let Ok(id) = font.get(b"FontDescriptor").and_then(Object::as_reference) {
        return Some(id);
    }
    let descendants = font.get(b"DescendantFonts").ok().and_then(|o| resolve(doc, o))?;
    let first = descendants.as_array().ok()?.first()?;
    let descendant = match resolve(doc, first)? {
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    descendant
        .get(b"FontDescriptor")
        .and_then(Object::as_reference)
        .ok()
}

/// Sets [`SUBSET_FLAG`] on the font's descriptor and Flate-compresses an
/// embedded font program that has no filter yet.
pub fn optimize_font(doc: &mut Document, font_id: ObjectId) -> Result<FontOutcome> {
    let Some(descriptor_id) = descriptor_id(doc, font_id) else {
        return Ok(FontOutcome::NoDescriptor);
    };

    let descriptor = doc
        .get_dictionary_mut(descriptor_id)
        .with_context(|| format!("Font descriptor {} is not a dictionary", descriptor_id.0))?;
    let flags = descriptor.get(b"Flags").and_then(Object::as_i64).unwrap_or(0);
    descriptor.set("Flags", Object::Integer(flags | SUBSET_FLAG));

    let program_id = FONT_PROGRAM_KEYS
        .iter()
        .find_map(|key| descriptor.get(key).and_then(Object::as_reference).ok());
    let Some(program_id) = program_id else {
        return Ok(FontOutcome::Flagged {
            program_compressed: false,
        });
    };

    let stream = match doc.objects.get_mut(&program_id) {
        Some(Object::Stream(stream)) => stream,
        _ => bail!("Font program {} is not a stream", program_id.0),
    };
    if stream.dict.has(b"Filter") {
        return Ok(FontOutcome::Flagged {
            program_compressed: false,
        });
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(&stream.content)?;
    let compressed = encoder.finish()?;
    stream.dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    stream.set_content(compressed);

    Ok(FontOutcome::Flagged {
        program_compressed: true,
    })
}
