// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster stamping — burn the label into a rendered page image and wrap the
// result as a one-page PDF.

use image::{DynamicImage, RgbImage};
use stampwerk_core::config::RasterStampStyle;
use stampwerk_core::error::StampwerkError;
use stampwerk_core::{PageBox, StampLabel};
use tracing::{debug, instrument};

use crate::image::font::LabelFont;
use crate::pdf::writer::PdfWriter;

/// Draws labels into page images.
pub struct RasterStamper {
    style: RasterStampStyle,
    font: LabelFont,
    writer: PdfWriter,
}

impl RasterStamper {
    /// Create a stamper, resolving the label font once up front.
    pub fn new(style: RasterStampStyle) -> Result<Self, StampwerkError> {
        let font = LabelFont::load(&style)?;
        Ok(Self::with_font(style, font))
    }

    pub fn with_font(style: RasterStampStyle, font: LabelFont) -> Self {
        let mut writer = PdfWriter::new();
        writer.set_title("Stampwerk page");
        Self { style, font, writer }
    }

    pub fn style(&self) -> &RasterStampStyle {
        &self.style
    }

    /// Draw `label` at the configured pixel offset from the top-left corner.
    pub fn burn_label(&self, image: DynamicImage, label: &StampLabel) -> RgbImage {
        let mut canvas = image.into_rgb8();
        self.font.draw(
            &mut canvas,
            &label.to_string(),
            self.style.x_px as i32,
            self.style.y_px as i32,
            self.style.font_size_px,
            self.style.color,
        );
        canvas
    }

    /// Burn `label` into `image` and return a one-page PDF of `page_box` size.
    /// `image` and `page_box` are both in displayed orientation.
    #[instrument(skip(self, image), fields(label = %label))]
    pub fn stamp_page(
        &self,
        image: DynamicImage,
        label: &StampLabel,
        page_box: PageBox,
    ) -> Result<Vec<u8>, StampwerkError> {
        let canvas = self.burn_label(image, label);
        debug!(width = canvas.width(), height = canvas.height(), "Label burned in");
        self.writer
            .image_page(&DynamicImage::ImageRgb8(canvas), page_box)
    }
}
