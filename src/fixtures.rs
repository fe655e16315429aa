//! In-memory documents for unit tests.

use std::io::Write;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Deterministic noisy RGB samples; noise keeps Flate from shrinking them
/// much, so JPEG re-encoding has something to win.
pub fn noisy_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let mut out = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state & 0x3f) as u8;
            out.push(((x * 255 / width.max(1)) as u8).wrapping_add(noise));
            out.push(((y * 255 / height.max(1)) as u8).wrapping_add(noise));
            out.push(noise.wrapping_mul(3));
        }
    }
    out
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn rgb_image_stream(width: u32, height: u32) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        zlib(&noisy_rgb(width, height)),
    )
}

/// `pages` pages sharing one noisy image and one embedded TrueType font.
/// Every page carries annotations, a thumbnail, piece info and metadata.
pub fn sample_document(pages: u32, width: u32, height: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(rgb_image_stream(width, height));
    let font_file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => 64 },
        vec![0x42; 64],
    ));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "Demo",
        "Flags" => 4,
        "FontFile2" => font_file_id,
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => "Demo",
        "FontDescriptor" => descriptor_id,
    });
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"q 200 0 0 200 0 0 cm /Im1 Do Q BT /F1 12 Tf (Hi) Tj ET".to_vec(),
        ));
        let thumb_id = doc.add_object(rgb_image_stream(4, 4));
        let metadata_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            b"<x:xmpmeta/>".to_vec(),
        ));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Rect" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(10), Object::Integer(10)],
            "Contents" => Object::string_literal("note"),
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
            "Annots" => vec![Object::Reference(annot_id)],
            "Thumb" => thumb_id,
            "Metadata" => metadata_id,
            "PieceInfo" => dictionary! { "App" => dictionary! { "Private" => "Data" } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Quarterly report"),
        "Author" => Object::string_literal("Someone"),
        "Producer" => Object::string_literal("fixtures"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc
}

pub fn to_bytes(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn first_page(doc: &Document) -> ObjectId {
    *doc.get_pages().values().next().unwrap()
}
