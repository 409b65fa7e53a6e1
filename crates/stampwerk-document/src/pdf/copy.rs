// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deep copy of lopdf objects between documents.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use stampwerk_core::error::StampwerkError;
use tracing::warn;

use super::reader::{INHERITABLE_KEYS, inherited_attribute};

/// Copies pages and their transitive references from one source document.
///
/// Source object IDs are remembered so that objects shared between pages are
/// copied once and reference cycles terminate.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub(crate) fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy one page into `target`, returning the new page's ID. The page is
    /// made self-contained: inheritable attributes from the source page tree
    /// are materialised on the copy. /Parent is left for the caller.
    pub(crate) fn clone_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId, StampwerkError> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            StampwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        // Register first so annotations pointing back at the page (/P) resolve
        // to the copy.
        let new_id = target.new_object_id();
        self.copied.insert(page_id, new_id);

        let mut page_dict = self.clone_dictionary(target, page);
        for key in INHERITABLE_KEYS {
            if page_dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                let cloned = self.clone_object(target, &value);
                page_dict.set(key.to_vec(), cloned);
            }
        }

        target.objects.insert(new_id, Object::Dictionary(page_dict));
        Ok(new_id)
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(existing) = self.copied.get(&id) {
            return Object::Reference(*existing);
        }
        let source = self.source;
        match source.get_object(id) {
            Ok(referenced) => {
                let new_id = target.new_object_id();
                self.copied.insert(id, new_id);
                let cloned = self.clone_object(target, referenced);
                target.objects.insert(new_id, cloned);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        }
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            // /Parent would drag the whole source page tree along.
            if key == b"Parent" {
                continue;
            }
            let cloned = self.clone_object(target, value);
            new_dict.set(key.clone(), cloned);
        }
        new_dict
    }

    pub(crate) fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Reference(id) => self.clone_reference(target, *id),
            Object::Stream(stream) => {
                let mut cloned = stream.clone();
                cloned.dict = self.clone_dictionary(target, &stream.dict);
                Object::Stream(cloned)
            }
            // Boolean, Integer, Real, String, Name, Null
            other => other.clone(),
        }
    }
}
