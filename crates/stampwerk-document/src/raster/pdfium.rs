// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfium backend — renders in-process through a dynamically loaded pdfium
// library, so CCITT, JBIG2 and JPEG 2000 scans come out right without poppler.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use stampwerk_core::PageBox;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument};

use super::PageRasterizer;

/// Renders with pdfium. The library is bound per call; nothing is held open
/// between files.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    /// Directory holding the pdfium shared library. `None` tries the working
    /// directory, then the system library path.
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Load pdfium only from `dir`.
    pub fn with_library_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: Some(dir.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, StampwerkError> {
        let bindings = match &self.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|err| StampwerkError::Rasterize(format!("cannot load pdfium: {}", err)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    #[instrument(skip(self, _page_box), fields(path = %path.display()))]
    fn rasterize_first_page(
        &self,
        path: &Path,
        _page_box: PageBox,
        dpi: u32,
    ) -> Result<DynamicImage, StampwerkError> {
        let pdfium = self.bind()?;
        let document = pdfium.load_pdf_from_file(path, None).map_err(|err| {
            StampwerkError::Rasterize(format!("pdfium cannot open {}: {}", path.display(), err))
        })?;
        let page = document
            .pages()
            .get(0)
            .map_err(|err| StampwerkError::Rasterize(format!("pdfium has no page 1: {}", err)))?;

        // pdfium reports the displayed size, with /Rotate already applied.
        let scale = dpi as f32 / 72.0;
        let width = ((page.width().value * scale).round() as i32).max(1);
        let height = ((page.height().value * scale).round() as i32).max(1);
        debug!(width, height, dpi, "Rendering page with pdfium");

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width)
                    .set_target_height(height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|err| StampwerkError::Rasterize(format!("pdfium render failed: {}", err)))?;
        Ok(bitmap.as_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn missing_library_is_a_rasterize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_fixtures::write_file(dir.path(), "scan.pdf", &test_fixtures::scanned_pdf(1));
        let rasterizer = PdfiumRasterizer::with_library_dir(dir.path().join("no-pdfium-here"));

        let result = rasterizer.rasterize_first_page(
            &path,
            PageBox::from_size(test_fixtures::PAGE_WIDTH, test_fixtures::PAGE_HEIGHT),
            72,
        );
        match result {
            Err(StampwerkError::Rasterize(msg)) => assert!(msg.contains("pdfium"), "got {msg}"),
            other => panic!("expected a rasterize error, got {other:?}"),
        }
    }
}
