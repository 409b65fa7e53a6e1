// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — turn the first page of an image-only PDF into pixels.
//
// Three backends: poppler's `pdftoppm` (a full renderer, when installed),
// pdfium loaded in-process, and an embedded-image extractor that pulls the scan
// image straight out of the page. `Auto` tries them in that order.

pub mod embedded;
pub mod pdfium;
pub mod poppler;

use std::path::Path;

use image::DynamicImage;
use stampwerk_core::error::StampwerkError;
use stampwerk_core::{PageBox, RasterBackend};
use tracing::warn;

pub use embedded::EmbeddedImageRasterizer;
pub use pdfium::PdfiumRasterizer;
pub use poppler::PopplerRasterizer;

/// Renders page 1 of a PDF file to an image.
pub trait PageRasterizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Render the first page of `path`, whose unrotated box is `page_box`, at
    /// `dpi`. The image is in displayed orientation: a page with `/Rotate 90`
    /// comes back with its axes swapped.
    fn rasterize_first_page(
        &self,
        path: &Path,
        page_box: PageBox,
        dpi: u32,
    ) -> Result<DynamicImage, StampwerkError>;
}

/// Build the rasterizer for `backend`.
pub fn for_backend(backend: RasterBackend) -> Box<dyn PageRasterizer> {
    match backend {
        RasterBackend::Auto => Box::new(AutoRasterizer::default()),
        RasterBackend::Poppler => Box::new(PopplerRasterizer::default()),
        RasterBackend::Pdfium => Box::new(PdfiumRasterizer::default()),
        RasterBackend::Embedded => Box::new(EmbeddedImageRasterizer),
    }
}

/// Poppler first, then pdfium, then embedded images.
#[derive(Debug, Default)]
pub struct AutoRasterizer {
    poppler: PopplerRasterizer,
    pdfium: PdfiumRasterizer,
    embedded: EmbeddedImageRasterizer,
}

impl PageRasterizer for AutoRasterizer {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn rasterize_first_page(
        &self,
        path: &Path,
        page_box: PageBox,
        dpi: u32,
    ) -> Result<DynamicImage, StampwerkError> {
        let err = match self.poppler.rasterize_first_page(path, page_box, dpi) {
            Ok(image) => return Ok(image),
            Err(err) => err,
        };
        warn!(%err, path = %path.display(), "pdftoppm unavailable, trying pdfium");
        match self.pdfium.rasterize_first_page(path, page_box, dpi) {
            Ok(image) => Ok(image),
            Err(err) => {
                warn!(%err, path = %path.display(), "pdfium unavailable, using embedded page image");
                self.embedded.rasterize_first_page(path, page_box, dpi)
            }
        }
    }
}
