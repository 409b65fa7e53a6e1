// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Poppler backend — shells out to `pdftoppm` and loads the PNG it writes.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use stampwerk_core::PageBox;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument, warn};

use super::PageRasterizer;
use crate::image::processor::ImageProcessor;

const DEFAULT_PROGRAM: &str = "pdftoppm";
const OUTPUT_STEM: &str = "page";

/// Renders pages with poppler-utils' `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

impl PopplerRasterizer {
    /// Use a specific `pdftoppm` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn name(&self) -> &'static str {
        "poppler"
    }

    #[instrument(skip(self, page_box), fields(path = %path.display()))]
    fn rasterize_first_page(
        &self,
        path: &Path,
        page_box: PageBox,
        dpi: u32,
    ) -> Result<DynamicImage, StampwerkError> {
        let workdir = tempfile::Builder::new().prefix("stampwerk-").tempdir()?;
        let stem = workdir.path().join(OUTPUT_STEM);

        let output = Command::new(&self.program)
            .args(["-f", "1", "-l", "1", "-r"])
            .arg(dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&stem)
            .output()
            .map_err(|err| {
                StampwerkError::Rasterize(format!(
                    "cannot run {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            return Err(StampwerkError::Rasterize(format!(
                "{} failed ({}): {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // pdftoppm pads the page number to the page count's width.
        let rendered = find_rendered_page(workdir.path())?;
        let image = ImageProcessor::open(&rendered)?.into_dynamic();
        debug!(
            width = image.width(),
            height = image.height(),
            expected = ?page_box.pixel_size(dpi),
            "Page rendered"
        );

        if let Err(err) = workdir.close() {
            warn!(%err, "Failed to remove rasterizer scratch directory");
        }
        Ok(image)
    }
}

fn find_rendered_page(dir: &Path) -> Result<PathBuf, StampwerkError> {
    std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| {
            path.extension().is_some_and(|ext| ext == "png")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(OUTPUT_STEM))
        })
        .ok_or_else(|| StampwerkError::Rasterize("pdftoppm produced no page image".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_rasterize_error() {
        let rasterizer = PopplerRasterizer::with_program("/nonexistent/bin/pdftoppm");
        let result = rasterizer.rasterize_first_page(
            Path::new("whatever.pdf"),
            PageBox::from_size(612.0, 792.0),
            200,
        );
        assert!(matches!(result, Err(StampwerkError::Rasterize(_))));
    }

    #[test]
    fn finds_padded_output_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-01.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        assert_eq!(
            find_rendered_page(dir.path()).unwrap(),
            dir.path().join("page-01.png")
        );
    }

    #[test]
    fn empty_output_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_rendered_page(dir.path()),
            Err(StampwerkError::Rasterize(_))
        ));
    }
}
