//! Enumerates the images and fonts a page draws with.
//!
//! Classification happens here and only here: callers receive
//! [`PageResource`] values and never inspect dictionaries themselves.
//! Form XObjects are walked through so images nested in forms are found too.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

const MAX_REFERENCE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResource {
    Image { name: String, id: ObjectId },
    Font { name: String, id: ObjectId },
}

impl PageResource {
    pub fn id(&self) -> ObjectId {
        match self {
            PageResource::Image { id, .. } | PageResource::Font { id, .. } => *id,
        }
    }
}

/// Follows a chain of references to the object it ends at.
pub fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.objects.get(id)?,
            other => return Some(other),
        }
    }
    None
}

pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Looks `key` up on the page, then on its `Parent` chain.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut seen = HashSet::new();
    let mut current = page_id;
    while seen.insert(current) {
        let dict = doc.objects.get(&current)?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    dict.get(key).and_then(Object::as_name).ok()
}

/// Images and fonts reachable from the page's resource dictionary.
/// Each object id appears at most once.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Vec<PageResource> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    if let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|o| resolve_dict(doc, o)) {
        collect(doc, resources, &mut found, &mut seen);
    }
    found
}

fn collect(
    doc: &Document,
    resources: &Dictionary,
    found: &mut Vec<PageResource>,
    seen: &mut HashSet<ObjectId>,
) {
    if let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| resolve_dict(doc, o)) {
        for (name, entry) in xobjects.iter() {
            let Object::Reference(id) = entry else {
                continue;
            };
            if !seen.insert(*id) {
                continue;
            }
            let Some(Object::Stream(stream)) = doc.objects.get(id) else {
                continue;
            };
            match name_of(&stream.dict, b"Subtype") {
                Some(subtype) if subtype == b"Image" => found.push(PageResource::Image {
                    name: String::from_utf8_lossy(name).into_owned(),
                    id: *id,
                }),
                Some(subtype) if subtype == b"Form" => {
                    if let Some(inner) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|o| resolve_dict(doc, o))
                    {
                        collect(doc, inner, found, seen);
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(fonts) = resources.get(b"Font").ok().and_then(|o| resolve_dict(doc, o)) {
        for (name, entry) in fonts.iter() {
            // Direct font dictionaries cannot be edited by id; they are rare
            // enough to leave alone.
            let Object::Reference(id) = entry else {
                continue;
            };
            if !seen.insert(*id) {
                continue;
            }
            let is_font = doc
                .objects
                .get(id)
                .and_then(|o| o.as_dict().ok())
                .is_some_and(|dict| name_of(dict, b"Type").map_or(true, |t| t == b"Font"));
            if is_font {
                found.push(PageResource::Font {
                    name: String::from_utf8_lossy(name).into_owned(),
                    id: *id,
                });
            }
        }
    }
}
