use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashSet;

use super::decode_pdf_string;

/// One outline item in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// 1-based nesting depth.
    pub level: u32,
    pub title: String,
    /// 1-based page, or `None` when the destination does not resolve to a
    /// page of this document.
    pub page: Option<u32>,
    #[serde(skip)]
    pub selected: bool,
}

impl TocEntry {
    pub fn new(level: u32, title: impl Into<String>, page: Option<u32>) -> Self {
        TocEntry {
            level,
            title: title.into(),
            page,
            selected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    pub level: u32,
    pub title: String,
    pub page: Option<u32>,
    pub children: Vec<TocNode>,
}

/// Read the outline of a document as a flat, leveled list.
///
/// Returns an empty list when the document has no outline.
pub fn extract_toc(doc: &Document) -> Result<Vec<TocEntry>> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    let outlines = match catalog.get(b"Outlines") {
        Ok(Object::Reference(r)) => match doc.get_dictionary(*r) {
            Ok(d) => d,
            _ => return Ok(Vec::new()),
        },
        Ok(Object::Dictionary(d)) => d,
        _ => return Ok(Vec::new()),
    };

    let first_ref = match outlines.get(b"First") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Vec::new()),
    };

    let page_map = build_page_map(doc);
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    walk_outline(doc, first_ref, &page_map, 1, &mut visited, &mut entries);

    tracing::debug!(entries = entries.len(), "read outline");
    Ok(entries)
}

fn walk_outline(
    doc: &Document,
    first_id: ObjectId,
    page_map: &[(ObjectId, u32)],
    level: u32,
    visited: &mut HashSet<ObjectId>,
    entries: &mut Vec<TocEntry>,
) {
    let mut current_id = Some(first_id);

    while let Some(id) = current_id {
        if !visited.insert(id) {
            tracing::warn!(?id, "outline loops back on itself; stopping");
            break;
        }

        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(_) => break,
        };

        let title = match dict.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => "Untitled".to_string(),
        };

        let page = get_destination_page(doc, dict, page_map);
        entries.push(TocEntry::new(level, title, page));

        if let Ok(Object::Reference(child_ref)) = dict.get(b"First") {
            walk_outline(doc, *child_ref, page_map, level + 1, visited, entries);
        }

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }
}

fn get_destination_page(
    doc: &Document,
    dict: &lopdf::Dictionary,
    page_map: &[(ObjectId, u32)],
) -> Option<u32> {
    if let Ok(dest) = dict.get(b"Dest") {
        return resolve_destination(doc, dest, page_map);
    }

    let action = match dict.get(b"A") {
        Ok(Object::Reference(action_ref)) => doc.get_dictionary(*action_ref).ok()?,
        Ok(Object::Dictionary(action_dict)) => action_dict,
        _ => return None,
    };

    match action.get(b"S") {
        Ok(Object::Name(action_type)) if action_type == b"GoTo" => {
            resolve_destination(doc, action.get(b"D").ok()?, page_map)
        }
        _ => None,
    }
}

fn resolve_destination(doc: &Document, dest: &Object, page_map: &[(ObjectId, u32)]) -> Option<u32> {
    match dest {
        Object::String(name, _) | Object::Name(name) => {
            resolve_named_destination(doc, name, page_map)
        }
        Object::Array(arr) => get_page_from_dest_array(arr, page_map),
        // Entries of the named destination trees may be wrapped as << /D [...] >>
        Object::Dictionary(d) => resolve_destination(doc, d.get(b"D").ok()?, page_map),
        Object::Reference(r) => resolve_destination(doc, doc.get_object(*r).ok()?, page_map),
        _ => None,
    }
}

fn resolve_named_destination(
    doc: &Document,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
) -> Option<u32> {
    let catalog = doc.catalog().ok()?;

    if let Ok(Object::Reference(names_ref)) = catalog.get(b"Names") {
        if let Ok(names_dict) = doc.get_dictionary(*names_ref) {
            if let Ok(Object::Reference(dests_ref)) = names_dict.get(b"Dests") {
                let mut visited = HashSet::new();
                if let Some(page) =
                    search_name_tree(doc, *dests_ref, name, page_map, &mut visited)
                {
                    return Some(page);
                }
            }
        }
    }

    // Legacy /Dests dictionary
    if let Ok(Object::Reference(dests_ref)) = catalog.get(b"Dests") {
        if let Ok(dests_dict) = doc.get_dictionary(*dests_ref) {
            if let Ok(dest) = dests_dict.get(name) {
                return resolve_destination(doc, dest, page_map);
            }
        }
    }

    None
}

fn search_name_tree(
    doc: &Document,
    node_id: ObjectId,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
    visited: &mut HashSet<ObjectId>,
) -> Option<u32> {
    if !visited.insert(node_id) {
        return None;
    }
    let dict = doc.get_dictionary(node_id).ok()?;

    if let Ok(Object::Array(names)) = dict.get(b"Names") {
        for pair in names.chunks(2) {
            if let [Object::String(key, _), value] = pair {
                if key == name {
                    return resolve_destination(doc, value, page_map);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Some(page) = search_name_tree(doc, *kid_ref, name, page_map, visited) {
                    return Some(page);
                }
            }
        }
    }

    None
}

fn get_page_from_dest_array(arr: &[Object], page_map: &[(ObjectId, u32)]) -> Option<u32> {
    // [page_ref /XYZ left top zoom] and friends
    match arr.first() {
        Some(Object::Reference(page_ref)) => page_map
            .iter()
            .find(|(id, _)| id == page_ref)
            .map(|(_, num)| *num),
        _ => None,
    }
}

fn build_page_map(doc: &Document) -> Vec<(ObjectId, u32)> {
    let mut pages: Vec<_> = doc.get_pages().into_iter().collect();
    pages.sort_by_key(|(num, _)| *num);
    pages.into_iter().map(|(num, id)| (id, num)).collect()
}

/// Nest a flat, leveled list into a tree.
///
/// Each entry becomes a child of the nearest preceding entry with a strictly
/// smaller level, so gaps such as 1, 3, 2 still nest under the level-1 entry.
pub fn build_tree(entries: &[TocEntry]) -> Vec<TocNode> {
    let mut roots: Vec<TocNode> = Vec::new();
    // Path of indices from the roots down to the most recent node.
    let mut path: Vec<usize> = Vec::new();
    let mut levels: Vec<u32> = Vec::new();

    for entry in entries {
        while levels.last().is_some_and(|&l| l >= entry.level) {
            levels.pop();
            path.pop();
        }

        let node = TocNode {
            level: entry.level,
            title: entry.title.clone(),
            page: entry.page,
            children: Vec::new(),
        };

        let siblings = path
            .iter()
            .fold(&mut roots, |nodes, &i| &mut nodes[i].children);
        siblings.push(node);
        path.push(siblings.len() - 1);
        levels.push(entry.level);
    }

    roots
}
