// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay compositing — merge the content of a one-page overlay PDF on top of
// an existing page, in place.
//
// The existing page content is wrapped in `q … Q` so its graphics state cannot
// leak into the overlay. Overlay resources are copied into the target document
// under fresh names and the overlay content stream is rewritten to use them.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use stampwerk_core::PageBox;
use stampwerk_core::error::StampwerkError;
use tracing::{debug, instrument};

use super::copy::ObjectCopier;
use super::reader::{inherited_attribute, resolve};

/// Resource categories a content stream refers to by name.
const RESOURCE_CATEGORIES: [&[u8]; 7] = [
    b"Font",
    b"XObject",
    b"ExtGState",
    b"ColorSpace",
    b"Pattern",
    b"Shading",
    b"Properties",
];

/// Prefix for resource names introduced by an overlay.
const OVERLAY_NAME_PREFIX: &str = "Stw";

/// Maps overlay resource names to their collision-free names on the target
/// page, per category.
type Renames = HashMap<Vec<u8>, HashMap<Vec<u8>, Vec<u8>>>;

/// Composite page 1 of `overlay` onto `page_id` of `target`.
///
/// `page_box` is the target page's box; the overlay is assumed to be drawn with
/// its origin at the box's lower-left corner.
#[instrument(skip(target, overlay))]
pub fn composite_overlay(
    target: &mut Document,
    page_id: ObjectId,
    page_box: PageBox,
    overlay: &Document,
) -> Result<(), StampwerkError> {
    let overlay_page = overlay
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| StampwerkError::PdfError("overlay document has no pages".into()))?;

    let raw_content = overlay.get_page_content(overlay_page).map_err(|err| {
        StampwerkError::PdfError(format!("cannot read overlay content: {}", err))
    })?;
    let mut content = Content::decode(&raw_content).map_err(|err| {
        StampwerkError::PdfError(format!("cannot parse overlay content: {}", err))
    })?;

    // Merge resources first; the renames decide how the content is rewritten.
    let mut resources = owned_resources(target, page_id)?;
    let overlay_resources = match inherited_attribute(overlay, overlay_page, b"Resources") {
        Some(object) => resolve(overlay, &object)?.as_dict().cloned().unwrap_or_default(),
        None => Dictionary::new(),
    };
    let renames = merge_resources(target, &mut resources, overlay, &overlay_resources)?;
    rename_operands(&mut content, &renames);

    let mut operations = Vec::with_capacity(content.operations.len() + 3);
    operations.push(Operation::new("q", vec![]));
    if page_box.llx != 0.0 || page_box.lly != 0.0 {
        operations.push(Operation::new(
            "cm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                page_box.llx.into(),
                page_box.lly.into(),
            ],
        ));
    }
    operations.extend(content.operations);
    operations.push(Operation::new("Q", vec![]));
    let overlay_bytes = Content { operations }.encode().map_err(|err| {
        StampwerkError::PdfError(format!("cannot encode overlay content: {}", err))
    })?;

    let save_id = target.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let restore_id = target.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
    let overlay_id = target.add_object(Stream::new(dictionary! {}, overlay_bytes));

    let mut contents = vec![Object::Reference(save_id)];
    contents.extend(existing_contents(target, page_id)?);
    contents.push(Object::Reference(restore_id));
    contents.push(Object::Reference(overlay_id));

    let page = target
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| StampwerkError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));

    debug!(?page_id, "Overlay composited");
    Ok(())
}

/// The page's effective resource dictionary as an owned value, with each
/// category resolved to a direct dictionary so it can be extended.
fn owned_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, StampwerkError> {
    let Some(object) = inherited_attribute(doc, page_id, b"Resources") else {
        return Ok(Dictionary::new());
    };
    let mut resources = resolve(doc, &object)?.as_dict().cloned().unwrap_or_default();

    for category in RESOURCE_CATEGORIES {
        let resolved = match resources.get(category) {
            Ok(value @ Object::Reference(_)) => resolve(doc, value)?.as_dict().ok().cloned(),
            _ => None,
        };
        if let Some(dict) = resolved {
            resources.set(category.to_vec(), Object::Dictionary(dict));
        }
    }
    Ok(resources)
}

/// Copy every named overlay resource into `target` and register it in
/// `resources` under a name not already used on the page.
fn merge_resources(
    target: &mut Document,
    resources: &mut Dictionary,
    overlay: &Document,
    overlay_resources: &Dictionary,
) -> Result<Renames, StampwerkError> {
    let mut copier = ObjectCopier::new(overlay);
    let mut renames = Renames::new();

    for category in RESOURCE_CATEGORIES {
        let Ok(entries) = overlay_resources.get(category) else {
            continue;
        };
        let Ok(entries) = resolve(overlay, entries)?.as_dict() else {
            continue;
        };

        let mut existing = match resources.get(category) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        let category_renames = renames.entry(category.to_vec()).or_default();

        for (name, value) in entries.iter() {
            let fresh = fresh_name(&existing, name);
            let copied = copier.clone_object(target, value);
            existing.set(fresh.clone(), copied);
            category_renames.insert(name.clone(), fresh);
        }
        resources.set(category.to_vec(), Object::Dictionary(existing));
    }

    // Keep the overlay's /ProcSet entries if the page had none.
    if !resources.has(b"ProcSet")
        && let Ok(procset) = overlay_resources.get(b"ProcSet")
    {
        let copied = copier.clone_object(target, procset);
        resources.set("ProcSet", copied);
    }

    Ok(renames)
}

/// `Stw<name>`, suffixed with a counter until it does not clash.
fn fresh_name(existing: &Dictionary, name: &[u8]) -> Vec<u8> {
    let mut candidate = [OVERLAY_NAME_PREFIX.as_bytes(), name].concat();
    let mut counter = 1u32;
    while existing.has(&candidate) {
        candidate = [
            OVERLAY_NAME_PREFIX.as_bytes(),
            name,
            counter.to_string().as_bytes(),
        ]
        .concat();
        counter += 1;
    }
    candidate
}

/// The resource category and operand position a name operand refers to.
fn named_operand(operation: &Operation) -> Option<(&'static str, usize)> {
    match operation.operator.as_str() {
        "Tf" => Some(("Font", 0)),
        "Do" => Some(("XObject", 0)),
        "gs" => Some(("ExtGState", 0)),
        "sh" => Some(("Shading", 0)),
        "cs" | "CS" => Some(("ColorSpace", 0)),
        "scn" | "SCN" => Some(("Pattern", operation.operands.len().checked_sub(1)?)),
        "BDC" | "DP" => Some(("Properties", 1)),
        _ => None,
    }
}

fn rename_operands(content: &mut Content, renames: &Renames) {
    for operation in &mut content.operations {
        let Some((category, index)) = named_operand(operation) else {
            continue;
        };
        let Some(category_renames) = renames.get(category.as_bytes()) else {
            continue;
        };
        if let Some(Object::Name(name)) = operation.operands.get_mut(index)
            && let Some(fresh) = category_renames.get(name.as_slice())
        {
            *name = fresh.clone();
        }
    }
}

/// The page's current content streams as a list of references.
fn existing_contents(doc: &mut Document, page_id: ObjectId) -> Result<Vec<Object>, StampwerkError> {
    let contents = doc
        .get_dictionary(page_id)
        .map_err(|err| StampwerkError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?
        .get(b"Contents")
        .ok()
        .cloned();

    let items = match contents {
        None => Vec::new(),
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        // Direct streams are invalid in /Contents; lift into an indirect object.
        Some(Object::Stream(stream)) => vec![Object::Reference(doc.add_object(stream))],
        Some(other) => {
            return Err(StampwerkError::PdfError(format!(
                "unexpected /Contents on page {:?}: {:?}",
                page_id, other
            )));
        }
    };
    Ok(items)
}
