// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-layer detection — decides whether a document is stamped as vector text
// or by rasterizing its first page.

use std::path::Path;

use stampwerk_core::{ClassificationScope, DocumentKind};
use tracing::{debug, instrument};

use crate::pdf::reader::PdfReader;

/// Detects whether a PDF carries an extractable text layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    scope: ClassificationScope,
}

impl Classifier {
    pub fn new(scope: ClassificationScope) -> Self {
        Self { scope }
    }

    /// True if text can be extracted from the inspected pages. Any failure,
    /// including an unreadable file, counts as "no text".
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn is_text_pdf(&self, path: impl AsRef<Path>) -> bool {
        match PdfReader::open(path.as_ref()) {
            Ok(reader) => self.has_text(&reader),
            Err(err) => {
                debug!(%err, "Cannot open for classification");
                false
            }
        }
    }

    /// Classify an already-opened document.
    pub fn classify(&self, reader: &PdfReader) -> DocumentKind {
        DocumentKind::from_has_text(self.has_text(reader))
    }

    fn has_text(&self, reader: &PdfReader) -> bool {
        let page_numbers: Vec<u32> = match self.scope {
            ClassificationScope::FirstPage => vec![1],
            ClassificationScope::AllPages => (1..=reader.page_count() as u32).collect(),
        };

        // Page by page, so one unreadable page does not hide text on another.
        page_numbers.into_iter().any(|page_number| {
            match reader.extract_text(&[page_number]) {
                Ok(text) => !text.trim().is_empty(),
                Err(err) => {
                    debug!(page_number, %err, "Text extraction failed, treating as image-only");
                    false
                }
            }
        })
    }
}
