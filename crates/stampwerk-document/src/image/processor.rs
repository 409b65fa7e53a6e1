// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode and resize rendered pages. Operates on in-memory
// images using the `image` crate.

use image::DynamicImage;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, info, instrument};

/// Wraps a single in-memory page image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining.
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StampwerkError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            StampwerkError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, StampwerkError> {
        let img = image::load_from_memory(data).map_err(|err| {
            StampwerkError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// A no-op when the image already has that size.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Resizing image"
        );
        let resized = self
            .image
            .resize_exact(width, height, image::imageops::FilterType::Triangle);
        Self { image: resized }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn decodes_jpeg_bytes() {
        let processor = ImageProcessor::from_bytes(&test_fixtures::scan_jpeg(64, 48)).unwrap();
        assert_eq!((processor.width(), processor.height()), (64, 48));
    }

    #[test]
    fn resize_exact_ignores_aspect() {
        let processor = ImageProcessor::from_bytes(&test_fixtures::scan_jpeg(64, 48))
            .unwrap()
            .resize_exact(100, 10);
        assert_eq!((processor.width(), processor.height()), (100, 10));
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"nope"),
            Err(StampwerkError::ImageError(_))
        ));
    }
}
