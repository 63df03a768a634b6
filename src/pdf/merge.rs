//! Concatenate whole documents, in the order given.

use anyhow::{bail, Context, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use super::tree;

/// Merge `documents` into one PDF; pages keep their document's position in
/// the input, and their own order within it.
///
/// `on_loaded` is called with the index of each document once it has been
/// parsed and copied in.
pub fn merge_documents<F>(documents: &[Vec<u8>], mut on_loaded: F) -> Result<Vec<u8>>
where
    F: FnMut(usize),
{
    let Some((first, rest)) = documents.split_first() else {
        bail!("No documents to merge");
    };

    let mut dest = Document::load_mem(first).context("Failed to load document 1")?;
    let mut page_ids: Vec<ObjectId> = dest.get_pages().into_values().collect();
    on_loaded(0);

    for (i, bytes) in rest.iter().enumerate() {
        let source = Document::load_mem(bytes)
            .with_context(|| format!("Failed to load document {}", i + 2))?;

        // Shift every id in the source above the destination's range.
        let offset = dest.max_id;
        let source_max_id = source.max_id;
        page_ids.extend(
            source
                .get_pages()
                .into_values()
                .map(|(num, generation)| (num + offset, generation)),
        );
        for ((num, generation), mut object) in source.objects {
            shift_references(&mut object, offset);
            dest.objects.insert((num + offset, generation), object);
        }
        dest.max_id = dest.max_id.max(source_max_id + offset);

        debug!(document = i + 2, pages = page_ids.len(), "copied document");
        on_loaded(i + 1);
    }

    let pages = page_ids
        .into_iter()
        .map(|id| tree::detached_page(&dest, id))
        .collect::<Result<Vec<_>>>()?;
    tree::finish(tree::isolate(&dest, pages)?)
}

fn shift_references(object: &mut Object, offset: u32) {
    match object {
        Object::Reference(id) => id.0 += offset,
        Object::Array(items) => {
            for item in items {
                shift_references(item, offset);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                shift_references(value, offset);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tree::test_support::{
        cross_linked_pdf, page_labels, page_objects, sample_pdf,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_empty_fails() {
        let err = merge_documents(&[], |_| {}).unwrap_err();
        assert!(err.to_string().contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document() {
        let merged = merge_documents(&[sample_pdf(2, "Only")], |_| {}).unwrap();
        assert_eq!(page_labels(&merged), vec!["Only-1", "Only-2"]);
    }

    #[test]
    fn test_merge_preserves_document_order() {
        let docs = vec![sample_pdf(2, "A"), sample_pdf(1, "B"), sample_pdf(2, "C")];
        let merged = merge_documents(&docs, |_| {}).unwrap();
        assert_eq!(page_labels(&merged), vec!["A-1", "A-2", "B-1", "C-1", "C-2"]);
    }

    #[test]
    fn test_merge_keeps_one_copy_of_each_page() {
        let docs = vec![cross_linked_pdf(3, "A"), cross_linked_pdf(2, "B")];
        let merged = merge_documents(&docs, |_| {}).unwrap();
        assert_eq!(page_labels(&merged), vec!["A-1", "A-2", "A-3", "B-1", "B-2"]);
        assert_eq!(page_objects(&merged), 5);
    }

    #[test]
    fn test_merge_reports_each_document() {
        let docs = vec![sample_pdf(1, "A"), sample_pdf(1, "B"), sample_pdf(1, "C")];
        let mut seen = Vec::new();
        merge_documents(&docs, |i| seen.push(i)).unwrap();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_names_broken_document() {
        let docs = vec![sample_pdf(1, "A"), b"garbage".to_vec()];
        let err = merge_documents(&docs, |_| {}).unwrap_err();
        assert!(err.to_string().contains("document 2"));
    }

    #[test]
    fn test_shift_references_nested() {
        let mut object = Object::Array(vec![
            Object::Reference((1, 0)),
            Object::Dictionary(lopdf::dictionary! { "K" => Object::Reference((4, 0)) }),
        ]);
        shift_references(&mut object, 10);

        let items = object.as_array().unwrap();
        assert_eq!(items[0].as_reference().unwrap(), (11, 0));
        let dict = items[1].as_dict().unwrap();
        assert_eq!(dict.get(b"K").unwrap().as_reference().unwrap(), (14, 0));
    }
}
