// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vector stamping — the label is drawn on a transparent one-page overlay and
// composited onto the page, leaving the existing content untouched.

use lopdf::{Document, ObjectId};
use stampwerk_core::StampLabel;
use stampwerk_core::config::VectorStampStyle;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument};

use crate::pdf::overlay::composite_overlay;
use crate::pdf::reader;
use crate::pdf::writer::PdfWriter;

/// Draws labels as Helvetica text onto existing PDF pages.
pub struct VectorStamper {
    style: VectorStampStyle,
    writer: PdfWriter,
}

impl VectorStamper {
    pub fn new(style: VectorStampStyle) -> Self {
        let mut writer = PdfWriter::new();
        writer.set_title("Stampwerk label");
        Self { style, writer }
    }

    pub fn style(&self) -> &VectorStampStyle {
        &self.style
    }

    /// Stamp `label` onto `page_id` of `document` in place.
    #[instrument(skip(self, document), fields(label = %label))]
    pub fn stamp(
        &self,
        document: &mut Document,
        page_id: ObjectId,
        label: &StampLabel,
    ) -> Result<(), StampwerkError> {
        let page_box = reader::page_box(document, page_id)?;
        let overlay_bytes = self
            .writer
            .label_overlay(page_box, &label.to_string(), &self.style)?;
        let overlay = Document::load_mem(&overlay_bytes).map_err(|err| {
            StampwerkError::PdfError(format!("cannot load label overlay: {}", err))
        })?;

        composite_overlay(document, page_id, page_box, &overlay)?;
        debug!(width = page_box.width(), height = page_box.height(), "Vector label applied");
        Ok(())
    }
}

impl Default for VectorStamper {
    fn default() -> Self {
        Self::new(VectorStampStyle::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::accumulator::OutputAccumulator;
    use crate::pdf::reader::PdfReader;
    use crate::test_fixtures;
    use lopdf::content::Content;

    fn stamped(lines: &[&str], label: &StampLabel) -> PdfReader {
        let mut reader = PdfReader::from_bytes(&test_fixtures::text_pdf(lines)).unwrap();
        let page_id = reader.page_id(1).unwrap();
        VectorStamper::default()
            .stamp(reader.document_mut(), page_id, label)
            .unwrap();

        let mut acc = OutputAccumulator::new();
        acc.append_document(reader.document()).unwrap();
        PdfReader::from_bytes(&acc.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn label_text_is_added_next_to_existing_text() {
        let label = StampLabel::for_index("Lasku", 0, 0).unwrap();
        let reader = stamped(&["Invoice body"], &label);
        let text = reader.extract_text(&[1]).unwrap();
        assert!(text.contains("Invoice body"));
        assert!(text.contains("Lasku 0001"));
    }

    #[test]
    fn stamp_adds_text_but_no_image() {
        let label = StampLabel::for_index("Lasku", 41, 0).unwrap();
        let reader = stamped(&["Body"], &label);
        let page_id = reader.page_id(1).unwrap();
        let content = reader.document().get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;

        let text_ops = ops.iter().filter(|op| op.operator == "Tj" || op.operator == "TJ").count();
        assert!(text_ops >= 2);
        assert!(!ops.iter().any(|op| op.operator == "Do"));
    }

    #[test]
    fn only_the_given_page_is_stamped() {
        let label = StampLabel::for_index("Lasku", 0, 2).unwrap();
        let reader = stamped(&["first", "second"], &label);
        assert!(reader.extract_text(&[1]).unwrap().contains("Lasku 0003"));
        assert!(!reader.extract_text(&[2]).unwrap().contains("Lasku"));
    }
}
