//! Page tree surgery shared by extraction and merging.
//!
//! Both operations detach the pages they want from the source page tree and
//! hand them to [`isolate`], which builds a new document holding only those
//! pages and the objects they reach.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Copy of a page dictionary with inherited attributes made explicit, so it
/// can be hung directly under the root `Pages` node.
pub fn detached_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .with_context(|| format!("Page object {:?} is not a dictionary", page_id))?
        .clone();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        depth += 1;

        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Build a new document whose page tree is exactly `pages`, in order.
///
/// Only the objects these pages reach are copied, plus the Info dictionary.
/// References back into the source page tree (an annotation's `/P`, a link
/// destination, a bookmark) become null, so unselected pages never come
/// along. Document-level structure such as outlines is not carried over.
pub fn isolate(source: &Document, pages: Vec<Dictionary>) -> Result<Document> {
    isolate_from(source, &page_tree_nodes(source), pages)
}

/// [`isolate`] with the source's page tree nodes worked out once by the
/// caller, for building many documents from the same source.
pub fn isolate_from(
    source: &Document,
    stale: &BTreeSet<ObjectId>,
    mut pages: Vec<Dictionary>,
) -> Result<Document> {
    let mut doc = Document::with_version(source.version.clone());
    doc.max_id = source.max_id;

    let mut pending = Vec::new();
    for page in &mut pages {
        sever_dict(page, stale, &mut pending);
    }
    let info = source
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();
    pending.extend(info);
    copy_reachable(source, &mut doc, stale, pending);
    if let Some(info) = info.filter(|id| doc.objects.contains_key(id)) {
        doc.trailer.set("Info", Object::Reference(info));
    }

    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());
    for mut page in pages {
        page.set("Parent", Object::Reference(pages_id));
        kids.push(Object::Reference(doc.add_object(page)));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

/// Every page and page tree node of `doc`.
pub fn page_tree_nodes(doc: &Document) -> BTreeSet<ObjectId> {
    let mut nodes: BTreeSet<ObjectId> = doc.get_pages().into_values().collect();
    for (id, object) in &doc.objects {
        let Ok(dict) = object.as_dict() else {
            continue;
        };
        if let Ok(kind) = dict.get(b"Type").and_then(Object::as_name) {
            if kind == b"Page" || kind == b"Pages" {
                nodes.insert(*id);
            }
        }
    }
    nodes
}

fn copy_reachable(
    source: &Document,
    doc: &mut Document,
    stale: &BTreeSet<ObjectId>,
    mut pending: Vec<ObjectId>,
) {
    while let Some(id) = pending.pop() {
        if stale.contains(&id) || doc.objects.contains_key(&id) {
            continue;
        }
        // Dangling references stay dangling.
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        let mut object = object.clone();
        sever(&mut object, stale, &mut pending);
        doc.objects.insert(id, object);
    }
}

/// Null out references into `stale`, collecting the others into `found`.
fn sever(object: &mut Object, stale: &BTreeSet<ObjectId>, found: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => {
            let id = *id;
            if stale.contains(&id) {
                *object = Object::Null;
            } else {
                found.push(id);
            }
        }
        Object::Array(items) => {
            for item in items {
                sever(item, stale, found);
            }
        }
        Object::Dictionary(dict) => sever_dict(dict, stale, found),
        Object::Stream(stream) => sever_dict(&mut stream.dict, stale, found),
        _ => {}
    }
}

fn sever_dict(dict: &mut Dictionary, stale: &BTreeSet<ObjectId>, found: &mut Vec<ObjectId>) {
    for (_, value) in dict.iter_mut() {
        sever(value, stale, found);
    }
}

/// Serialize after dropping unreachable objects.
pub fn finish(mut doc: Document) -> Result<Vec<u8>> {
    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("Failed to serialize PDF")?;
    Ok(buffer)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detached_page_inherits_media_box() {
        let doc = Document::load_mem(&sample_pdf(2, "T")).unwrap();
        let page_id = doc.get_pages()[&1];

        let page = detached_page(&doc, page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(!page.has(b"Parent"));
    }

    #[test]
    fn test_isolate_reverses_order() {
        let doc = Document::load_mem(&sample_pdf(3, "R")).unwrap();
        let pages: Vec<_> = doc
            .get_pages()
            .into_values()
            .rev()
            .map(|id| detached_page(&doc, id).unwrap())
            .collect();

        let bytes = finish(isolate(&doc, pages).unwrap()).unwrap();
        assert_eq!(page_labels(&bytes), vec!["R-3", "R-2", "R-1"]);
    }

    #[test]
    fn test_isolate_leaves_other_pages_behind() {
        let source = cross_linked_pdf(20, "L");
        let doc = Document::load_mem(&source).unwrap();
        let first = doc.get_pages()[&1];
        let page = detached_page(&doc, first).unwrap();

        let bytes = finish(isolate(&doc, vec![page]).unwrap()).unwrap();
        assert_eq!(page_labels(&bytes), vec!["L-1"]);
        assert_eq!(page_objects(&bytes), 1);
        assert!(bytes.len() < source.len() / 2);

        // The link annotation survives, minus its references to old pages.
        let out = Document::load_mem(&bytes).unwrap();
        let page_id = out.get_pages()[&1];
        let annots = out.get_dictionary(page_id).unwrap().get(b"Annots").unwrap();
        let annot_id = annots.as_array().unwrap()[0].as_reference().unwrap();
        let annot = out.get_dictionary(annot_id).unwrap();
        assert!(matches!(annot.get(b"P"), Ok(Object::Null)));
        assert!(!out.catalog().unwrap().has(b"Outlines"));
    }
}
