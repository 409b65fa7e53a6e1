// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents using the `lopdf` crate.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use stampwerk_core::PageBox;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, info, instrument};

/// Page attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on /Parent hops, guarding against cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Reads an existing PDF file.
///
/// Wraps `lopdf::Document` and exposes the page-level inspection the stamping
/// pipeline needs: page order, page boxes, and text extraction.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StampwerkError> {
        let path_ref = path.as_ref();
        if !path_ref.is_file() {
            return Err(StampwerkError::InputFileNotFound(path_ref.to_path_buf()));
        }
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            StampwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        let reader = Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        };
        reader.ensure_pages()?;
        debug!(pages = reader.page_count(), "PDF loaded");
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, StampwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            StampwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        let reader = Self {
            document,
            source_path: None,
        };
        reader.ensure_pages()?;
        debug!(pages = reader.page_count(), "PDF loaded from bytes");
        Ok(reader)
    }

    fn ensure_pages(&self) -> Result<(), StampwerkError> {
        if self.page_count() == 0 {
            return Err(StampwerkError::PdfError(format!(
                "{} has no pages",
                self.source_path.as_deref().unwrap_or("document")
            )));
        }
        Ok(())
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object IDs in reading order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // `get_pages` is a BTreeMap keyed by 1-indexed page number.
        self.document.get_pages().into_values().collect()
    }

    /// Object ID of a page by 1-indexed page number.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId, StampwerkError> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            StampwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    /// The media box of a page, following page-tree inheritance.
    pub fn page_box(&self, page_id: ObjectId) -> Result<PageBox, StampwerkError> {
        page_box(&self.document, page_id)
    }

    /// The page's `/Rotate` in clockwise degrees, normalised to 0, 90, 180
    /// or 270.
    pub fn page_rotation(&self, page_id: ObjectId) -> u32 {
        page_rotation(&self.document, page_id)
    }

    /// Extract the text layer of the given pages (1-indexed).
    pub fn extract_text(&self, page_numbers: &[u32]) -> Result<String, StampwerkError> {
        self.document.extract_text(page_numbers).map_err(|err| {
            StampwerkError::PdfError(format!(
                "text extraction failed for pages {:?}: {}",
                page_numbers, err
            ))
        })
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Access ---------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

// -- Object helpers -----------------------------------------------------------

/// Follow a reference to the object it points at; other objects are returned
/// as-is.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, StampwerkError> {
    match object {
        Object::Reference(id) => doc.get_object(*id).map_err(|err| {
            StampwerkError::PdfError(format!("cannot resolve reference {:?}: {}", id, err))
        }),
        other => Ok(other),
    }
}

/// Look up `key` on a page dictionary, walking up /Parent links for the
/// attributes the page tree allows to be inherited.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Effective `/Rotate` of `page_id`. Values that are not a multiple of 90 are
/// invalid and read as 0.
pub(crate) fn page_rotation(doc: &Document, page_id: ObjectId) -> u32 {
    let degrees = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|value| resolve(doc, &value).ok().and_then(|v| v.as_i64().ok()))
        .unwrap_or(0);
    if degrees % 90 != 0 {
        debug!(?page_id, degrees, "Ignoring invalid /Rotate");
        return 0;
    }
    degrees.rem_euclid(360) as u32
}

/// Read the media box of `page_id`. Pages without one fall back to US Letter,
/// as PDF readers conventionally do.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> Result<PageBox, StampwerkError> {
    let Some(media_box) = inherited_attribute(doc, page_id, b"MediaBox") else {
        debug!(?page_id, "No /MediaBox, assuming US Letter");
        return Ok(PageBox::from_size(612.0, 792.0));
    };

    let array = match resolve(doc, &media_box)? {
        Object::Array(array) if array.len() == 4 => array,
        other => {
            return Err(StampwerkError::PdfError(format!(
                "malformed /MediaBox on page {:?}: {:?}",
                page_id, other
            )));
        }
    };

    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(array) {
        *slot = resolve(doc, value)?.as_float().map_err(|err| {
            StampwerkError::PdfError(format!("non-numeric /MediaBox entry: {}", err))
        })?;
    }

    let page = PageBox::new(coords[0], coords[1], coords[2], coords[3]);
    if page.width() <= 0.0 || page.height() <= 0.0 {
        return Err(StampwerkError::PdfError(format!(
            "degenerate /MediaBox on page {:?}",
            page_id
        )));
    }
    Ok(page)
}
