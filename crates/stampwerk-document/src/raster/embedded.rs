// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded-image backend — scanned pages are usually a single full-page image,
// so the largest image XObject on page 1 stands in for a rendering of it.
//
// Handles DCTDecode (JPEG) images and sample data at 1, 2, 4, 8 or 16 bits per
// component in Gray/RGB/CMYK/ICCBased or Indexed colour spaces, raw or behind
// Flate/LZW/ASCII85 filters, with /Decode ranges applied. CCITT, JBIG2 and
// JPEG 2000 need a real renderer (poppler or pdfium).

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use stampwerk_core::PageBox;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument};

use super::PageRasterizer;
use crate::image::processor::ImageProcessor;
use crate::pdf::reader::{PdfReader, page_rotation, resolve};

/// Extracts the dominant page image instead of rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImageRasterizer;

impl PageRasterizer for EmbeddedImageRasterizer {
    fn name(&self) -> &'static str {
        "embedded"
    }

    #[instrument(skip(self, page_box), fields(path = %path.display()))]
    fn rasterize_first_page(
        &self,
        path: &Path,
        page_box: PageBox,
        dpi: u32,
    ) -> Result<DynamicImage, StampwerkError> {
        let reader = PdfReader::open(path)?;
        let page_id = reader.page_id(1)?;
        let image = page_image(reader.document(), page_id).map_err(|err| match err {
            StampwerkError::Rasterize(msg) => {
                StampwerkError::Rasterize(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        let (width, height) = page_box.pixel_size(dpi);
        let rotation = page_rotation(reader.document(), page_id);
        debug!(
            source_width = image.width(),
            source_height = image.height(),
            width,
            height,
            rotation,
            "Embedded page image extracted"
        );
        let image = ImageProcessor::from_dynamic(image)
            .resize_exact(width, height)
            .into_dynamic();
        // Hand back what a viewer shows, as the rendering backends do.
        Ok(match rotation {
            90 => image.rotate90(),
            180 => image.rotate180(),
            270 => image.rotate270(),
            _ => image,
        })
    }
}

/// Decode the largest image XObject drawn on `page_id`.
pub(crate) fn page_image(doc: &Document, page_id: ObjectId) -> Result<DynamicImage, StampwerkError> {
    let stream = largest_image(doc, page_id)?
        .ok_or_else(|| StampwerkError::Rasterize("page has no embedded image".into()))?;
    decode_image(doc, stream)
}

/// The image XObject on `page_id` with the most pixels.
fn largest_image(doc: &Document, page_id: ObjectId) -> Result<Option<&Stream>, StampwerkError> {
    // Walk up the page tree to the nearest /Resources, as inheritance does.
    let mut node_id = Some(page_id);
    for _ in 0..64 {
        let Some(id) = node_id else { break };
        let node = doc
            .get_dictionary(id)
            .map_err(|err| StampwerkError::PdfError(format!("bad page tree node: {}", err)))?;
        if let Ok(resources) = node.get(b"Resources") {
            return match resolve(doc, resources)? {
                Object::Dictionary(resources) => largest_in(doc, resources),
                _ => Ok(None),
            };
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(None)
}

fn largest_in<'a>(doc: &'a Document, resources: &'a Dictionary) -> Result<Option<&'a Stream>, StampwerkError> {
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(None);
    };
    let Ok(xobjects) = resolve(doc, xobjects)?.as_dict() else {
        return Ok(None);
    };

    let mut best: Option<(i64, &Stream)> = None;
    for (_, object) in xobjects.iter() {
        let Ok(Object::Stream(stream)) = resolve(doc, object) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|subtype| subtype == b"Image");
        if !is_image {
            continue;
        }
        let pixels = dimension(&stream.dict, b"Width") * dimension(&stream.dict, b"Height");
        if best.is_none_or(|(most, _)| pixels > most) {
            best = Some((pixels, stream));
        }
    }
    Ok(best.map(|(_, stream)| stream))
}

fn dimension(dict: &Dictionary, key: &[u8]) -> i64 {
    dict.get(key).and_then(Object::as_i64).unwrap_or(0)
}

// -- Decoding -----------------------------------------------------------------

fn filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Stream data with any lossless filters undone.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, StampwerkError> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|err| StampwerkError::Rasterize(format!("cannot decompress image data: {}", err)))
}

fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, StampwerkError> {
    let filters = filters(stream);
    match filters.iter().map(Vec::as_slice).collect::<Vec<_>>().as_slice() {
        [b"DCTDecode"] => {
            return Ok(ImageProcessor::from_bytes(&stream.content)?.into_dynamic());
        }
        [b"FlateDecode", b"DCTDecode"] => {
            let jpeg = stream.decompressed_content().map_err(|err| {
                StampwerkError::Rasterize(format!("cannot inflate JPEG image: {}", err))
            })?;
            return Ok(ImageProcessor::from_bytes(&jpeg)?.into_dynamic());
        }
        lossless
            if lossless
                .iter()
                .all(|f| matches!(*f, b"FlateDecode" | b"LZWDecode" | b"ASCII85Decode")) => {}
        other => {
            let names: Vec<String> = other.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
            return Err(StampwerkError::Rasterize(format!(
                "unsupported image filter {}",
                names.join(", ")
            )));
        }
    }

    let width = u32::try_from(dimension(&stream.dict, b"Width")).unwrap_or(0);
    let height = u32::try_from(dimension(&stream.dict, b"Height")).unwrap_or(0);
    let is_mask = stream
        .dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let bits = if is_mask {
        1
    } else {
        match dimension(&stream.dict, b"BitsPerComponent") {
            bits @ (1 | 2 | 4 | 8 | 16) => bits as u32,
            bits => {
                return Err(StampwerkError::Rasterize(format!(
                    "unsupported image depth: {} bits per component",
                    bits
                )));
            }
        }
    };
    // A stencil mask paints 0 samples and leaves 1 samples, which reads the
    // same as black-on-white gray.
    let colorspace = if is_mask {
        ColorSpace::Device(1)
    } else {
        color_space(doc, &stream.dict)?
    };
    let decode = decode_ranges(&stream.dict);

    let data = stream_bytes(stream)?;
    let raw = unpack_samples(&data, width, height, colorspace.components(), bits)?;
    let samples = colorspace.to_samples(&raw, bits, decode.as_deref());
    samples_to_image(samples, width, height, colorspace.output_components())
}

#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    /// Direct samples with this many components.
    Device(usize),
    /// Palette indices into `palette`, whose entries have `base` components.
    Indexed { base: usize, hival: usize, palette: Vec<u8> },
}

impl ColorSpace {
    /// Components per pixel in the sample data.
    fn components(&self) -> usize {
        match self {
            Self::Device(n) => *n,
            Self::Indexed { .. } => 1,
        }
    }

    /// Components per pixel after palette expansion.
    fn output_components(&self) -> usize {
        match self {
            Self::Device(n) => *n,
            Self::Indexed { base, .. } => *base,
        }
    }

    /// Map raw `bits`-deep samples to 8-bit component values.
    fn to_samples(&self, raw: &[u16], bits: u32, decode: Option<&[f32]>) -> Vec<u8> {
        let max = ((1u32 << bits) - 1) as f32;
        match self {
            Self::Device(n) => raw
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    let (lo, hi) = decode
                        .and_then(|d| Some((*d.get(2 * (i % n))?, *d.get(2 * (i % n) + 1)?)))
                        .unwrap_or((0.0, 1.0));
                    let unit = lo + value as f32 / max * (hi - lo);
                    (unit.clamp(0.0, 1.0) * 255.0).round() as u8
                })
                .collect(),
            Self::Indexed { base, hival, palette } => {
                let (lo, hi) = decode
                    .and_then(|d| Some((*d.first()?, *d.get(1)?)))
                    .unwrap_or((0.0, max));
                let mut out = Vec::with_capacity(raw.len() * base);
                for &value in raw {
                    let index = (lo + value as f32 / max * (hi - lo)).round().clamp(0.0, *hival as f32) as usize;
                    let start = index * base;
                    match palette.get(start..start + base) {
                        Some(entry) => out.extend_from_slice(entry),
                        None => out.extend(std::iter::repeat_n(0, *base)),
                    }
                }
                out
            }
        }
    }
}

fn decode_ranges(dict: &Dictionary) -> Option<Vec<f32>> {
    let array = dict.get(b"Decode").and_then(Object::as_array).ok()?;
    array.iter().map(|value| value.as_float().ok()).collect()
}

fn color_space(doc: &Document, dict: &Dictionary) -> Result<ColorSpace, StampwerkError> {
    let colorspace = match dict.get(b"ColorSpace") {
        Ok(object) => resolve(doc, object)?,
        Err(_) => return Ok(ColorSpace::Device(1)),
    };
    if let Object::Array(items) = colorspace
        && items.first().and_then(|i| i.as_name().ok()) == Some(b"Indexed".as_slice())
    {
        let [_, base, hival, lookup] = items.as_slice() else {
            return Err(StampwerkError::Rasterize("malformed Indexed colour space".into()));
        };
        let base = base_components(doc, base)?;
        let hival = resolve(doc, hival)?
            .as_i64()
            .ok()
            .and_then(|h| usize::try_from(h).ok())
            .ok_or_else(|| StampwerkError::Rasterize("Indexed colour space without hival".into()))?;
        let palette = match resolve(doc, lookup)? {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => stream_bytes(stream)?,
            _ => return Err(StampwerkError::Rasterize("Indexed colour space without lookup".into())),
        };
        return Ok(ColorSpace::Indexed { base, hival, palette });
    }
    Ok(ColorSpace::Device(base_components(doc, colorspace)?))
}

/// Number of colour components of a non-indexed colour space.
fn base_components(doc: &Document, colorspace: &Object) -> Result<usize, StampwerkError> {
    match resolve(doc, colorspace)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(3),
            b"DeviceCMYK" | b"CMYK" => Ok(4),
            other => Err(StampwerkError::Rasterize(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            ))),
        },
        Object::Array(items) => match items.first().and_then(|i| i.as_name().ok()) {
            Some(b"ICCBased") => {
                let profile = items
                    .get(1)
                    .ok_or_else(|| StampwerkError::Rasterize("ICCBased without profile".into()))?;
                let n = resolve(doc, profile)?
                    .as_stream()
                    .ok()
                    .and_then(|profile| profile.dict.get(b"N").and_then(Object::as_i64).ok())
                    .unwrap_or(3);
                Ok(n as usize)
            }
            Some(b"CalGray") => Ok(1),
            Some(b"CalRGB") | Some(b"Lab") => Ok(3),
            Some(other) => Err(StampwerkError::Rasterize(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            ))),
            None => Err(StampwerkError::Rasterize("empty colour space array".into())),
        },
        _ => Err(StampwerkError::Rasterize("unsupported colour space".into())),
    }
}

/// Split packed sample data into one value per component. Rows start on a
/// byte boundary.
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bits: u32,
) -> Result<Vec<u16>, StampwerkError> {
    let per_row = width as usize * components;
    let stride = (per_row * bits as usize).div_ceil(8);
    if width == 0 || height == 0 || data.len() < stride * height as usize {
        return Err(StampwerkError::Rasterize(format!(
            "image data too short: {} bytes for {}x{}x{} at {} bits",
            data.len(),
            width,
            height,
            components,
            bits
        )));
    }

    let mut out = Vec::with_capacity(per_row * height as usize);
    for row in data.chunks_exact(stride).take(height as usize) {
        match bits {
            8 => out.extend(row.iter().map(|&b| b as u16)),
            16 => out.extend(row.chunks_exact(2).map(|p| u16::from_be_bytes([p[0], p[1]]))),
            _ => {
                let per_byte = (8 / bits) as usize;
                let mask = (1u16 << bits) - 1;
                out.extend((0..per_row).map(|i| {
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    (row[i / per_byte] as u16 >> shift) & mask
                }));
            }
        }
    }
    Ok(out)
}

fn samples_to_image(
    samples: Vec<u8>,
    width: u32,
    height: u32,
    components: usize,
) -> Result<DynamicImage, StampwerkError> {
    let expected = width as usize * height as usize * components;
    if width == 0 || height == 0 || samples.len() < expected {
        return Err(StampwerkError::Rasterize(format!(
            "image data too short: {} bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            components
        )));
    }
    let mut samples = samples;
    samples.truncate(expected);

    let image = match components {
        1 => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        4 => {
            let rgb: Vec<u8> = samples
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 255 - cmyk[3] as u16;
                    [0, 1, 2].map(|i| ((255 - cmyk[i] as u16) * k / 255) as u8)
                })
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        n => {
            return Err(StampwerkError::Rasterize(format!(
                "unsupported component count {}",
                n
            )));
        }
    };
    image.ok_or_else(|| StampwerkError::Rasterize("image buffer size mismatch".into()))
}
