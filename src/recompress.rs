//! Decoding image XObjects and re-encoding them at a lower quality/size.
//!
//! [`recompress`] and [`recompress_mask`] are pure: they take decoded pixels
//! and hand back new encoded bytes. Reading from and writing to the document
//! lives in [`decode_image`], [`decode_mask`] and the `write_*` helpers.

use std::borrow::Cow;
use std::io::{Read, Write};

use anyhow::{anyhow, bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, GrayImage, ImageFormat};
use lopdf::{Document, Object, ObjectId, Stream};

use crate::resources::resolve;

/// Resampling filter used for every downscale (bicubic).
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    fn color_space(self) -> &'static str {
        match self {
            Channels::Gray => "DeviceGray",
            Channels::Rgb => "DeviceRGB",
        }
    }

    fn extended(self) -> ExtendedColorType {
        match self {
            Channels::Gray => ExtendedColorType::L8,
            Channels::Rgb => ExtendedColorType::Rgb8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Jpeg,
    Flate,
}

impl Encoding {
    fn filter(self) -> &'static str {
        match self {
            Encoding::Jpeg => "DCTDecode",
            Encoding::Flate => "FlateDecode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressParams {
    /// 0.0..=1.0, mapped onto JPEG quality 1..=100.
    pub quality: f32,
    /// Linear factor applied to both dimensions. Never upscales.
    pub scale: f32,
    /// Upper bound for the longer side, applied after `scale`.
    pub max_dimension: Option<u32>,
    pub lossless: bool,
}

#[derive(Debug, Clone)]
pub struct Recompressed {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub encoding: Encoding,
}

impl Recompressed {
    pub fn encoded_len(&self) -> usize {
        self.bytes.len()
    }
}

/// A decoded image XObject plus what is needed to decide whether the
/// re-encoded version is worth keeping.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub soft_mask: Option<ObjectId>,
    pub encoded_len: usize,
}

pub fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

pub fn target_dimensions(
    width: u32,
    height: u32,
    scale: f32,
    max_dimension: Option<u32>,
) -> (u32, u32) {
    let scale = scale.clamp(f32::MIN_POSITIVE, 1.0);
    let mut w = (width as f32 * scale).round().max(1.0);
    let mut h = (height as f32 * scale).round().max(1.0);
    if let Some(max) = max_dimension {
        let longest = w.max(h);
        let max = max.max(1) as f32;
        if longest > max {
            let factor = max / longest;
            w = (w * factor).round().max(1.0);
            h = (h * factor).round().max(1.0);
        }
    }
    (w as u32, h as u32)
}

/// Resizes and re-encodes `image`. Does not touch the input.
pub fn recompress(image: &DynamicImage, params: &RecompressParams) -> Result<Recompressed> {
    let (width, height) = target_dimensions(
        image.width(),
        image.height(),
        params.scale,
        params.max_dimension,
    );
    let resized = if (width, height) == image.dimensions() {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image.resize_exact(width, height, RESIZE_FILTER))
    };

    let channels = if image.color().has_color() {
        Channels::Rgb
    } else {
        Channels::Gray
    };
    let samples = match channels {
        Channels::Gray => resized.to_luma8().into_raw(),
        Channels::Rgb => resized.to_rgb8().into_raw(),
    };

    let (bytes, encoding) = if params.lossless {
        (deflate(&samples)?, Encoding::Flate)
    } else {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(params.quality));
        encoder
            .encode(&samples, width, height, channels.extended())
            .context("JPEG encoding failed")?;
        (buffer, Encoding::Jpeg)
    };

    Ok(Recompressed {
        bytes,
        width,
        height,
        channels,
        encoding,
    })
}

/// Resizes a soft mask to `width`x`height` and Flate-encodes it.
pub fn recompress_mask(mask: &GrayImage, width: u32, height: u32) -> Result<Vec<u8>> {
    let samples = if mask.dimensions() == (width, height) {
        Cow::Borrowed(mask.as_raw())
    } else {
        Cow::Owned(image::imageops::resize(mask, width, height, RESIZE_FILTER).into_raw())
    };
    deflate(&samples)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn decompress_stream(stream: &Stream, object_id: ObjectId) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    match stream.decompressed_content() {
        Ok(content) => Ok(content),
        Err(e) => {
            // lopdf gives up on some damaged zlib streams that still inflate.
            if filter_names(stream).last().map(Vec::as_slice) == Some(b"FlateDecode".as_slice()) {
                log::debug!("Image {}: falling back to manual inflate", object_id.0);
                let mut decoder = flate2::read::ZlibDecoder::new(&stream.content[..]);
                let mut buffer = Vec::new();
                decoder
                    .read_to_end(&mut buffer)
                    .context("Manual zlib failed")?;
                Ok(buffer)
            } else {
                Err(anyhow!("Decompression failed: {:?}", e))
            }
        }
    }
}

fn filter_names(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Replaces indirect `Filter`/`DecodeParms` values (or indirect entries
/// inside their arrays) with the objects they point at.
pub fn inline_filter_references(doc: &mut Document, object_id: ObjectId) {
    for key in [b"Filter".as_slice(), b"DecodeParms".as_slice()] {
        let replacement = match doc.objects.get(&object_id) {
            Some(Object::Stream(stream)) => match stream.dict.get(key) {
                Ok(Object::Reference(id)) => Some(doc.objects.get(id).cloned().unwrap_or(Object::Null)),
                Ok(Object::Array(items)) if items.iter().any(|i| matches!(i, Object::Reference(_))) => {
                    Some(Object::Array(
                        items
                            .iter()
                            .map(|item| resolve(doc, item).cloned().unwrap_or(Object::Null))
                            .collect(),
                    ))
                }
                _ => None,
            },
            _ => None,
        };
        if let (Some(value), Some(Object::Stream(stream))) = (replacement, doc.objects.get_mut(&object_id)) {
            stream.dict.set(key, value);
        }
    }
}

fn device_components(family: &[u8]) -> Option<u32> {
    match family {
        b"DeviceGray" | b"CalGray" | b"G" => Some(1),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
        b"DeviceCMYK" | b"CMYK" => Some(4),
        _ => None,
    }
}

/// Component count of the declared colour space, `None` when there is none.
///
/// Only spaces that map onto DeviceGray/DeviceRGB without changing colours
/// pass. Separation, DeviceN, Lab, Indexed, Pattern and the like are errors.
fn declared_components(doc: &Document, stream: &Stream) -> Result<Option<u32>> {
    let Ok(color_space) = stream.dict.get(b"ColorSpace") else {
        return Ok(None);
    };
    match resolve(doc, color_space) {
        Some(Object::Name(name)) => match device_components(name) {
            Some(n) => Ok(Some(n)),
            None => bail!("colour space {} is left as is", String::from_utf8_lossy(name)),
        },
        Some(Object::Array(items)) => {
            let family = items.first().and_then(|o| o.as_name().ok()).unwrap_or_default();
            if family == b"ICCBased" {
                let n = items
                    .get(1)
                    .and_then(|o| resolve(doc, o))
                    .and_then(|o| match o {
                        Object::Stream(profile) => profile.dict.get(b"N").and_then(Object::as_i64).ok(),
                        _ => None,
                    });
                return match n {
                    Some(n @ (1 | 3 | 4)) => Ok(Some(n as u32)),
                    _ => bail!("ICC profile without a usable component count"),
                };
            }
            match device_components(family) {
                Some(n) => Ok(Some(n)),
                None => bail!("colour space {} is left as is", String::from_utf8_lossy(family)),
            }
        }
        _ => bail!("unreadable colour space"),
    }
}

/// Guesses the component count from the sample count of an image that
/// declares no colour space.
fn guessed_components(sample_len: usize, width: u32, height: u32) -> u32 {
    let pixels = width as usize * height as usize;
    match sample_len {
        len if len == pixels => 1,
        len if len == pixels * 4 => 4,
        _ => 3,
    }
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|cmyk| {
            let c = cmyk[0] as f32 / 255.0;
            let m = cmyk[1] as f32 / 255.0;
            let y = cmyk[2] as f32 / 255.0;
            let k = cmyk[3] as f32 / 255.0;
            [
                ((1.0 - c) * (1.0 - k) * 255.0) as u8,
                ((1.0 - m) * (1.0 - k) * 255.0) as u8,
                ((1.0 - y) * (1.0 - k) * 255.0) as u8,
            ]
        })
        .collect()
}

fn image_stream(doc: &Document, object_id: ObjectId) -> Result<&Stream> {
    match doc.objects.get(&object_id) {
        Some(Object::Stream(stream)) => Ok(stream),
        _ => Err(anyhow!("Object {} is not a stream", object_id.0)),
    }
}

/// Decodes an image XObject into pixels.
///
/// Supports DCT streams and 8-bit Gray/RGB/CMYK samples behind any filter
/// lopdf can undo. Stencil masks, custom `Decode` arrays, other bit depths
/// and colour spaces without a Device equivalent are reported as errors so
/// the caller skips them.
pub fn decode_image(doc: &Document, object_id: ObjectId) -> Result<DecodedImage> {
    let stream = image_stream(doc, object_id)?;
    let dict = &stream.dict;

    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        bail!("stencil masks are left as is");
    }
    if dict.has(b"Decode") {
        bail!("images with a Decode array are left as is");
    }

    let filters = filter_names(stream);
    if let Some(unsupported) = filters
        .iter()
        .find(|f| matches!(f.as_slice(), b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode"))
    {
        bail!("unsupported filter {}", String::from_utf8_lossy(unsupported));
    }

    let declared = declared_components(doc, stream)?;
    let soft_mask = dict.get(b"SMask").and_then(Object::as_reference).ok();
    let encoded_len = stream.content.len();

    if filters.last().map(Vec::as_slice) == Some(b"DCTDecode".as_slice()) {
        let jpeg = if filters.len() == 1 {
            Cow::Borrowed(&stream.content)
        } else {
            Cow::Owned(stream.decompressed_content().unwrap_or_else(|_| stream.content.clone()))
        };
        let image = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
            .context("Failed to decode JPEG image")?;
        return Ok(DecodedImage {
            image,
            soft_mask,
            encoded_len,
        });
    }

    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    if bits != 8 {
        bail!("{}-bit images are left as is", bits);
    }
    let width = dict.get(b"Width").and_then(Object::as_i64).unwrap_or(0);
    let height = dict.get(b"Height").and_then(Object::as_i64).unwrap_or(0);
    if width <= 0 || height <= 0 {
        bail!("image has no usable dimensions ({}x{})", width, height);
    }
    let (width, height) = (width as u32, height as u32);

    let mut samples = decompress_stream(stream, object_id)?;
    let components =
        declared.unwrap_or_else(|| guessed_components(samples.len(), width, height));
    let expected = width as usize * height as usize * components as usize;
    if samples.len() < expected {
        bail!("image data too short: {} < {}", samples.len(), expected);
    }
    samples.truncate(expected);

    let image = match components {
        1 => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        4 => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(DynamicImage::ImageRgb8),
        n => bail!("unsupported component count {}", n),
    }
    .ok_or_else(|| anyhow!("Failed to build {}-component image", components))?;

    Ok(DecodedImage {
        image,
        soft_mask,
        encoded_len,
    })
}

/// Decodes a soft mask as 8-bit gray. Returns the pixels and the current
/// encoded length.
pub fn decode_mask(doc: &Document, mask_id: ObjectId) -> Result<(GrayImage, usize)> {
    let decoded = decode_image(doc, mask_id).context("Failed to decode soft mask")?;
    Ok((decoded.image.to_luma8(), decoded.encoded_len))
}

/// Writes a recompressed image back into its stream.
pub fn write_image_stream(stream: &mut Stream, image: Recompressed) {
    let dict = &mut stream.dict;
    dict.set("Filter", Object::Name(image.encoding.filter().as_bytes().to_vec()));
    dict.set("Width", Object::Integer(image.width as i64));
    dict.set("Height", Object::Integer(image.height as i64));
    dict.set("ColorSpace", Object::Name(image.channels.color_space().as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");
    stream.set_content(image.bytes);
}

/// Writes a Flate-encoded gray soft mask back into its stream.
pub fn write_mask_stream(stream: &mut Stream, bytes: Vec<u8>, width: u32, height: u32) {
    let dict = &mut stream.dict;
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");
    stream.set_content(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use lopdf::dictionary;

    fn params(quality: f32, scale: f32) -> RecompressParams {
        RecompressParams {
            quality,
            scale,
            max_dimension: None,
            lossless: false,
        }
    }

    fn sample_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, fixtures::noisy_rgb(width, height)).unwrap(),
        )
    }

    #[test]
    fn jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.5), 50);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(1.7), 100);
    }

    #[test]
    fn dimensions_follow_scale_and_cap() {
        assert_eq!(target_dimensions(1000, 500, 0.5, None), (500, 250));
        assert_eq!(target_dimensions(1000, 500, 2.0, None), (1000, 500));
        assert_eq!(target_dimensions(1000, 500, 1.0, Some(200)), (200, 100));
        assert_eq!(target_dimensions(3, 3, 0.01, None), (1, 1));
    }

    #[test]
    fn recompress_resizes_without_touching_input() {
        let source = sample_rgb(80, 40);
        let before = source.clone();
        let out = recompress(&source, &params(0.5, 0.5)).unwrap();
        assert_eq!((out.width, out.height), (40, 20));
        assert_eq!(out.encoding, Encoding::Jpeg);
        assert_eq!(out.channels, Channels::Rgb);
        assert!(out.bytes.starts_with(&[0xFF, 0xD8]));
        assert_eq!(source.as_bytes(), before.as_bytes());
    }

    #[test]
    fn lower_quality_is_smaller() {
        let source = sample_rgb(96, 96);
        let high = recompress(&source, &params(0.95, 1.0)).unwrap();
        let low = recompress(&source, &params(0.2, 1.0)).unwrap();
        assert!(low.encoded_len() < high.encoded_len());
    }

    #[test]
    fn gray_stays_gray() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, image::Luma([128])));
        let out = recompress(&gray, &params(0.7, 1.0)).unwrap();
        assert_eq!(out.channels, Channels::Gray);
    }

    #[test]
    fn lossless_uses_flate() {
        let source = sample_rgb(16, 16);
        let out = recompress(
            &source,
            &RecompressParams {
                lossless: true,
                ..params(0.9, 1.0)
            },
        )
        .unwrap();
        assert_eq!(out.encoding, Encoding::Flate);
        let mut inflated = Vec::new();
        flate2::read::ZlibDecoder::new(&out.bytes[..])
            .read_to_end(&mut inflated)
            .unwrap();
        assert_eq!(inflated, source.to_rgb8().into_raw());
    }

    #[test]
    fn decodes_flate_rgb_stream() {
        let doc = fixtures::sample_document(1, 32, 16);
        let image_id = crate::resources::page_resources(&doc, fixtures::first_page(&doc))[0].id();
        let decoded = decode_image(&doc, image_id).unwrap();
        assert_eq!(decoded.image.dimensions(), (32, 16));
        assert!(decoded.soft_mask.is_none());
    }

    #[test]
    fn decodes_cmyk_samples() {
        let mut doc = Document::with_version("1.5");
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceCMYK",
                "BitsPerComponent" => 8,
            },
            vec![0, 0, 0, 0, 0, 0, 0, 255],
        ));
        let decoded = decode_image(&doc, id).unwrap();
        let rgb = decoded.image.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn rejects_what_it_cannot_rewrite() {
        let mut doc = Document::with_version("1.5");
        let stencil = doc.add_object(Stream::new(
            dictionary! { "Subtype" => "Image", "Width" => 8, "Height" => 1, "ImageMask" => true },
            vec![0xFF],
        ));
        let one_bit = doc.add_object(Stream::new(
            dictionary! { "Subtype" => "Image", "Width" => 8, "Height" => 1, "BitsPerComponent" => 1, "ColorSpace" => "DeviceGray" },
            vec![0xAA],
        ));
        let garbage_jpeg = doc.add_object(Stream::new(
            dictionary! { "Subtype" => "Image", "Width" => 8, "Height" => 8, "Filter" => "DCTDecode" },
            vec![1, 2, 3, 4],
        ));
        assert!(decode_image(&doc, stencil).is_err());
        assert!(decode_image(&doc, one_bit).is_err());
        assert!(decode_image(&doc, garbage_jpeg).is_err());
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let gray = GrayImage::from_pixel(width, height, image::Luma([90]));
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 80)
            .encode(gray.as_raw(), width, height, ExtendedColorType::L8)
            .unwrap();
        out
    }

    #[test]
    fn rejects_colour_spaces_without_device_equivalent() {
        let mut doc = Document::with_version("1.5");
        let separation = || {
            Object::Array(vec![
                Object::Name(b"Separation".to_vec()),
                Object::Name(b"PANTONE".to_vec()),
                Object::Name(b"DeviceCMYK".to_vec()),
                Object::Null,
            ])
        };
        let flate_separation = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => separation(),
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            fixtures::zlib(&[200; 64]),
        ));
        let jpeg_separation = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => separation(),
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes(8, 8),
        ));
        let lab = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => vec![
                    Object::Name(b"Lab".to_vec()),
                    Object::Dictionary(dictionary! {}),
                ],
                "BitsPerComponent" => 8,
            },
            vec![0; 6],
        ));
        let pattern = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "Pattern",
                "BitsPerComponent" => 8,
            },
            vec![0],
        ));
        for id in [flate_separation, jpeg_separation, lab, pattern] {
            let err = decode_image(&doc, id).unwrap_err();
            assert!(err.to_string().contains("left as is"), "{}: {}", id.0, err);
        }
    }

    #[test]
    fn declared_and_guessed_components() {
        let mut doc = Document::with_version("1.5");
        let icc = doc.add_object(Stream::new(dictionary! { "N" => 3 }, vec![]));
        let with_icc = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => vec![Object::Name(b"ICCBased".to_vec()), Object::Reference(icc)],
                "BitsPerComponent" => 8,
            },
            vec![10, 20, 30],
        ));
        assert_eq!(decoded_pixel(&doc, with_icc), [10, 20, 30]);

        let plain_jpeg = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes(4, 4),
        ));
        assert!(decode_image(&doc, plain_jpeg).is_ok());
        assert_eq!(guessed_components(16, 4, 4), 1);
        assert_eq!(guessed_components(64, 4, 4), 4);
        assert_eq!(guessed_components(48, 4, 4), 3);
    }

    fn decoded_pixel(doc: &Document, id: ObjectId) -> [u8; 3] {
        decode_image(doc, id).unwrap().image.to_rgb8().get_pixel(0, 0).0
    }

    #[test]
    fn inlines_referenced_filters() {
        let mut doc = Document::with_version("1.5");
        let filter_id = doc.add_object(Object::Name(b"FlateDecode".to_vec()));
        let id = doc.add_object(Stream::new(
            dictionary! { "Filter" => vec![Object::Reference(filter_id)] },
            fixtures::zlib(b"abc"),
        ));
        inline_filter_references(&mut doc, id);
        let stream = image_stream(&doc, id).unwrap();
        assert_eq!(filter_names(stream), vec![b"FlateDecode".to_vec()]);
        assert_eq!(decompress_stream(stream, id).unwrap(), b"abc".to_vec());
    }

    #[test]
    fn writes_back_stream() {
        let mut stream = fixtures::rgb_image_stream(10, 10);
        stream.dict.set("DecodeParms", dictionary! { "Predictor" => 15 });
        let out = recompress(&sample_rgb(10, 10), &params(0.5, 0.5)).unwrap();
        let len = out.encoded_len();
        write_image_stream(&mut stream, out);
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 5);
        assert_eq!(stream.dict.get(b"Length").unwrap().as_i64().unwrap(), len as i64);
        assert!(!stream.dict.has(b"DecodeParms"));
    }

    #[test]
    fn mask_resizes() {
        let mask = GrayImage::from_pixel(10, 10, image::Luma([200]));
        let bytes = recompress_mask(&mask, 5, 5).unwrap();
        let mut inflated = Vec::new();
        flate2::read::ZlibDecoder::new(&bytes[..])
            .read_to_end(&mut inflated)
            .unwrap();
        assert_eq!(inflated.len(), 25);
    }
}
