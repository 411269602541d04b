//! PDF fixtures shared by the unit tests and the CLI tests.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::path::Path;

/// Build a document with `num_pages` pages and an outline given as
/// `(level, title, page)` triples in document order. A page of 0 leaves the
/// outline item without a destination.
pub fn build_document(num_pages: u32, outline: &[(u32, &str, u32)]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);

    if !outline.is_empty() {
        let outlines_id = add_outline(&mut doc, outline, &page_ids);
        catalog.set("Outlines", Object::Reference(outlines_id));
    }

    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn build_pdf(num_pages: u32, outline: &[(u32, &str, u32)], path: &Path) {
    let mut doc = build_document(num_pages, outline);
    doc.save(path).unwrap();
}

fn add_outline(doc: &mut Document, outline: &[(u32, &str, u32)], page_ids: &[ObjectId]) -> ObjectId {
    let outlines_id = doc.new_object_id();
    let item_ids: Vec<ObjectId> = outline.iter().map(|_| doc.new_object_id()).collect();

    // Parent of each item is the nearest preceding item with a smaller level.
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(outline.len());
    let mut stack: Vec<usize> = Vec::new();
    for (i, (level, _, _)) in outline.iter().enumerate() {
        while let Some(&top) = stack.last() {
            if outline[top].0 >= *level {
                stack.pop();
            } else {
                break;
            }
        }
        parents.push(stack.last().copied());
        stack.push(i);
    }

    let mut groups: BTreeMap<Option<usize>, Vec<usize>> = BTreeMap::new();
    for (i, parent) in parents.iter().enumerate() {
        groups.entry(*parent).or_default().push(i);
    }

    let mut items: Vec<Dictionary> = outline
        .iter()
        .enumerate()
        .map(|(i, (_, title, page))| {
            let mut dict = Dictionary::new();
            dict.set("Title", encode_title(title));
            let parent = parents[i].map(|p| item_ids[p]).unwrap_or(outlines_id);
            dict.set("Parent", Object::Reference(parent));
            if *page > 0 {
                dict.set(
                    "Dest",
                    Object::Array(vec![
                        Object::Reference(page_ids[(*page - 1) as usize]),
                        Object::Name(b"Fit".to_vec()),
                    ]),
                );
            }
            dict
        })
        .collect();

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"Outlines".to_vec()));

    for (parent, kids) in &groups {
        for (k, &i) in kids.iter().enumerate() {
            if k > 0 {
                items[i].set("Prev", Object::Reference(item_ids[kids[k - 1]]));
            }
            if let Some(&next) = kids.get(k + 1) {
                items[i].set("Next", Object::Reference(item_ids[next]));
            }
        }
        let first = Object::Reference(item_ids[kids[0]]);
        let last = Object::Reference(item_ids[kids[kids.len() - 1]]);
        let target = match parent {
            Some(p) => &mut items[*p],
            None => &mut root,
        };
        target.set("First", first);
        target.set("Last", last);
        target.set("Count", Object::Integer(kids.len() as i64));
    }

    for (id, item) in item_ids.into_iter().zip(items) {
        doc.objects.insert(id, Object::Dictionary(item));
    }
    doc.objects.insert(outlines_id, Object::Dictionary(root));
    outlines_id
}

fn encode_title(title: &str) -> Object {
    if title.is_ascii() {
        return Object::String(title.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// The page numbers printed on each page of `doc`, in page order.
///
/// Fixture pages draw `(Page N)`, so a chunk's labels show exactly which
/// source pages it holds.
pub fn page_labels(doc: &Document) -> Vec<u32> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").unwrap() + "(Page ".len();
            let end = start + text[start..].find(')').unwrap();
            text[start..end].parse().unwrap()
        })
        .collect()
}

pub fn page_labels_of(path: &Path) -> Vec<u32> {
    page_labels(&Document::load(path).unwrap())
}
