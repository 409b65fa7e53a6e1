// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create one-page PDFs with `printpdf` 0.8: transparent label
// overlays for vector stamping and full-page image pages for raster stamping.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use lopdf::{Document, Object};
use printpdf::{
    BuiltinFont, Color, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt,
    RawImage, RawImageData, RawImageFormat, Rgb, TextItem, XObjectTransform,
};
use stampwerk_core::PageBox;
use stampwerk_core::config::VectorStampStyle;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument, warn};

/// Creates single-page PDF documents sized to an existing page.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            title: "Stampwerk".to_string(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    // -- Label overlay --------------------------------------------------------

    /// Create a transparent page of the same size as `page_box` carrying only
    /// `label`, drawn in Helvetica at the style's relative position.
    ///
    /// Coordinates are relative to the page box origin; the compositor
    /// translates the overlay onto boxes that do not start at `(0, 0)`.
    #[instrument(skip(self, style))]
    pub fn label_overlay(
        &self,
        page_box: PageBox,
        label: &str,
        style: &VectorStampStyle,
    ) -> Result<Vec<u8>, StampwerkError> {
        let x = page_box.width() * style.relative_x;
        let y = page_box.height() * style.relative_y;
        let (r, g, b) = style.color.to_unit();

        let ops = vec![
            Op::SaveGraphicsState,
            Op::StartTextSection,
            Op::SetFillColor {
                col: Color::Rgb(Rgb {
                    r,
                    g,
                    b,
                    icc_profile: None,
                }),
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(style.font_size_pt),
                font: BuiltinFont::Helvetica,
            },
            Op::SetTextCursor {
                pos: Point { x: Pt(x), y: Pt(y) },
            },
            Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(label.to_string())],
                font: BuiltinFont::Helvetica,
            },
            Op::EndTextSection,
            Op::RestoreGraphicsState,
        ];

        let mut doc = PdfDocument::new(&self.title);
        doc.with_pages(vec![PdfPage::new(
            pt_to_mm(page_box.width()),
            pt_to_mm(page_box.height()),
            ops,
        )]);

        debug!(x, y, "Label overlay laid out");
        Ok(save(&doc, &PdfSaveOptions::default()))
    }

    // -- Image page -----------------------------------------------------------

    /// Create a single-page PDF whose page is exactly `page_box` in size and
    /// fully covered by `image`.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn image_page(
        &self,
        image: &DynamicImage,
        page_box: PageBox,
    ) -> Result<Vec<u8>, StampwerkError> {
        let (img_width, img_height) = (image.width(), image.height());
        if img_width == 0 || img_height == 0 {
            return Err(StampwerkError::ImageError("cannot place an empty image".into()));
        }

        // Convert to RGB8 for printpdf.
        let rgb_image = image.to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb_image.into_raw()),
            width: img_width as usize,
            height: img_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        // At 72 DPI one pixel is one point; scale each axis onto the page.
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(page_box.width() / img_width as f32),
                scale_y: Some(page_box.height() / img_height as f32),
                dpi: Some(72.0),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(
            pt_to_mm(page_box.width()),
            pt_to_mm(page_box.height()),
            ops,
        )]);

        // Skip printpdf's image optimisation: it may JPEG-encode or downscale,
        // and the burned-in label must survive pixel for pixel.
        let options = PdfSaveOptions {
            image_optimization: None,
            ..PdfSaveOptions::default()
        };
        let bytes = save(&doc, &options);
        // printpdf sizes pages in millimetres; pin the box to the exact points.
        set_media_box(&bytes, page_box)
    }
}

fn pt_to_mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn save(doc: &PdfDocument, options: &PdfSaveOptions) -> Vec<u8> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(options, &mut warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "printpdf reported warnings while saving");
    }
    output
}

/// Rewrite the /MediaBox of every page in `bytes` to `[0 0 width height]`.
fn set_media_box(bytes: &[u8], page_box: PageBox) -> Result<Vec<u8>, StampwerkError> {
    let mut doc = Document::load_mem(bytes).map_err(|err| {
        StampwerkError::PdfError(format!("cannot reload generated page: {}", err))
    })?;
    let media_box = Object::Array(vec![
        0.into(),
        0.into(),
        page_box.width().into(),
        page_box.height().into(),
    ]);
    for page_id in doc.get_pages().into_values() {
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("MediaBox", media_box.clone());
            page.remove(b"CropBox");
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(|err| {
        StampwerkError::PdfError(format!("failed to serialise image page: {}", err))
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use image::{Rgb as Pixel, RgbImage};

    #[test]
    fn overlay_matches_page_size() {
        let page_box = PageBox::from_size(595.0, 842.0);
        let bytes = PdfWriter::new()
            .label_overlay(page_box, "Lasku 0001", &VectorStampStyle::default())
            .unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        let size = reader.page_box(reader.page_id(1).unwrap()).unwrap();
        assert!((size.width() - 595.0).abs() < 0.5);
        assert!((size.height() - 842.0).abs() < 0.5);
    }

    #[test]
    fn overlay_carries_the_label_text() {
        let bytes = PdfWriter::new()
            .label_overlay(
                PageBox::from_size(612.0, 792.0),
                "Lasku 0042",
                &VectorStampStyle::default(),
            )
            .unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let content = reader
            .document()
            .get_page_content(reader.page_id(1).unwrap())
            .unwrap();
        let ops = lopdf::content::Content::decode(&content).unwrap().operations;
        assert!(ops.iter().any(|op| op.operator == "Tj" || op.operator == "TJ"));
        assert!(ops.iter().any(|op| op.operator == "Tf"));
    }

    #[test]
    fn image_page_has_exact_box() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 60, Pixel([200, 10, 10])));
        let page_box = PageBox::from_size(306.0, 396.0);
        let bytes = PdfWriter::new().image_page(&image, page_box).unwrap();

        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        let size = reader.page_box(reader.page_id(1).unwrap()).unwrap();
        assert_eq!(size.width(), 306.0);
        assert_eq!(size.height(), 396.0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let result = PdfWriter::new().image_page(&image, PageBox::from_size(10.0, 10.0));
        assert!(matches!(result, Err(StampwerkError::ImageError(_))));
    }
}
