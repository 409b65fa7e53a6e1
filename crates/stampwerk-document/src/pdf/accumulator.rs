// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output accumulator — collects pages from any number of source documents into
// one fresh `lopdf::Document`, in append order.

use std::io::Write;

use lopdf::{Document, Object, ObjectId, dictionary};
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument};

use super::copy::ObjectCopier;

/// An ordered sequence of pages destined for a single output PDF.
///
/// Each appended page is deep-copied out of its source document together with
/// everything it references, so the source can be dropped right after.
pub struct OutputAccumulator {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for OutputAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputAccumulator {
    /// An empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut accumulator = Self {
            document,
            pages_id,
            kids: Vec::new(),
        };
        accumulator.sync_page_tree();
        accumulator
    }

    /// Number of pages collected so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kids.is_empty()
    }

    /// Borrow the accumulated document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    // -- Appending ------------------------------------------------------------

    /// Append a single page of `source`.
    pub fn append_page(&mut self, source: &Document, page_id: ObjectId) -> Result<(), StampwerkError> {
        let mut cloner = ObjectCopier::new(source);
        self.append_with(&mut cloner, page_id)?;
        self.sync_page_tree();
        Ok(())
    }

    /// Append `page_ids` of `source`, in the order given. Objects shared
    /// between those pages (fonts, images) are copied once.
    pub fn append_pages(&mut self, source: &Document, page_ids: &[ObjectId]) -> Result<(), StampwerkError> {
        let mut cloner = ObjectCopier::new(source);
        for &page_id in page_ids {
            self.append_with(&mut cloner, page_id)?;
        }
        self.sync_page_tree();
        Ok(())
    }

    /// Append every page of `source`. Returns the number of pages added.
    #[instrument(skip_all)]
    pub fn append_document(&mut self, source: &Document) -> Result<usize, StampwerkError> {
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        self.append_pages(source, &page_ids)?;
        debug!(added = page_ids.len(), total = self.page_count(), "Document appended");
        Ok(page_ids.len())
    }

    fn append_with(&mut self, cloner: &mut ObjectCopier<'_>, page_id: ObjectId) -> Result<(), StampwerkError> {
        let page = cloner.clone_page(&mut self.document, page_id)?;
        if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page) {
            dict.set("Parent", Object::Reference(self.pages_id));
        }
        self.kids.push(page);
        Ok(())
    }

    fn sync_page_tree(&mut self) {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the accumulated document into `target`.
    pub fn write_to<W: Write>(&mut self, target: &mut W) -> Result<(), StampwerkError> {
        self.document.save_to(target).map_err(|err| {
            StampwerkError::PdfError(format!("failed to serialise output PDF: {}", err))
        })
    }

    /// Serialise the accumulated document into memory.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, StampwerkError> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        Ok(output)
    }
}
