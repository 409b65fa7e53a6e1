// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Stampwerk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StampwerkError;

/// How a document's first page gets stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Has an extractable text layer; stamped with a vector overlay.
    TextBearing,
    /// No extractable text (typically a scan); stamped by rasterizing.
    ImageOnly,
}

impl DocumentKind {
    pub fn from_has_text(has_text: bool) -> Self {
        if has_text {
            Self::TextBearing
        } else {
            Self::ImageOnly
        }
    }
}

/// Which pages the classifier inspects for a text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationScope {
    /// Only page 1 is inspected.
    #[default]
    FirstPage,
    /// A document is text-bearing if any page yields text.
    AllPages,
}

/// Page rasterization backend for image-only documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterBackend {
    /// Try `pdftoppm`, then pdfium, then the embedded-image extractor.
    #[default]
    Auto,
    /// Render with poppler's `pdftoppm`.
    Poppler,
    /// Render in-process with a dynamically loaded pdfium library.
    Pdfium,
    /// Decode the page's largest embedded image directly.
    Embedded,
}

/// A page box in PDF user-space points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        // Normalise so that (llx, lly) is really the lower-left corner.
        Self {
            llx: llx.min(urx),
            lly: lly.min(ury),
            urx: llx.max(urx),
            ury: lly.max(ury),
        }
    }

    /// A box anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// The box as displayed under a `/Rotate` of `degrees` (a multiple of
    /// 90): quarter turns swap the axes.
    pub fn rotated(&self, degrees: u32) -> Self {
        if degrees % 180 == 90 {
            Self::new(self.lly, self.llx, self.ury, self.urx)
        } else {
            *self
        }
    }

    /// Pixel dimensions of this box rendered at `dpi`.
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let scale = dpi as f32 / 72.0;
        (
            (self.width() * scale).round().max(1.0) as u32,
            (self.height() * scale).round().max(1.0) as u32,
        )
    }
}

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };

    /// Channels scaled to 0.0..=1.0 for PDF colour operators.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// The identifier stamped onto a document's first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampLabel {
    prefix: String,
    sequence: u64,
}

impl StampLabel {
    /// Label for the file at `index` (0-based, in sorted order) when numbering
    /// starts after `offset`. Fails if the sequence number would not fit in
    /// a `u64`.
    pub fn for_index(prefix: &str, offset: u64, index: usize) -> Result<Self, StampwerkError> {
        let sequence = u64::try_from(index)
            .ok()
            .and_then(|index| offset.checked_add(index))
            .and_then(|sequence| sequence.checked_add(1))
            .ok_or(StampwerkError::SequenceOverflow { offset, index })?;
        Ok(Self {
            prefix: prefix.trim().to_string(),
            sequence,
        })
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl std::fmt::Display for StampLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{:04}", self.sequence)
        } else {
            write!(f, "{} {:04}", self.prefix, self.sequence)
        }
    }
}

/// A file that could not be processed and was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// A file that was stamped and added to the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub label: String,
    pub kind: DocumentKind,
    pub pages: usize,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of `.pdf` files found in the input directory.
    pub total_files: usize,
    pub processed: Vec<ProcessedFile>,
    pub failures: Vec<FileFailure>,
    /// Where the merged document was written, once finalized.
    pub output_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.processed.len()
    }

    /// Total pages contributed by successfully processed files.
    pub fn pages_written(&self) -> usize {
        self.processed.iter().map(|file| file.pages).sum()
    }
}
