use anyhow::{Context, Result};
use lopdf::{Document, Object};
use serde::Serialize;
use std::path::Path;

use super::tree;
use crate::page_range::PageSelection;

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument { doc })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).context("Failed to parse PDF")?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
                info.subject = get_string_from_dict(dict, b"Subject");
                info.keywords = get_string_from_dict(dict, b"Keywords");
            }
        }

        info.page_count = self.page_count();
        info
    }

    /// Build a new document holding the selected pages in selection order.
    ///
    /// A page selected more than once appears more than once; repeats share
    /// content streams and resources with the first copy. `on_page` is called
    /// with the position of each selected page once it has been copied.
    pub fn extract_pages<F>(&self, pages: &PageSelection, mut on_page: F) -> Result<Document>
    where
        F: FnMut(usize),
    {
        let all_pages = self.doc.get_pages();
        let total = all_pages.len() as u32;

        let mut selected = Vec::with_capacity(pages.len());
        for (i, page) in pages.iter().enumerate() {
            let page_id = all_pages
                .get(page)
                .with_context(|| format!("Page {} is out of range (1-{})", page, total))?;
            selected.push(tree::detached_page(&self.doc, *page_id)?);
            on_page(i);
        }

        tree::isolate(&self.doc, selected)
    }

    /// One single-page document per page, in page order.
    pub fn page_documents<F>(&self, mut on_page: F) -> Result<Vec<Document>>
    where
        F: FnMut(usize),
    {
        let stale = tree::page_tree_nodes(&self.doc);
        let mut documents = Vec::new();
        for (i, page_id) in self.doc.get_pages().into_values().enumerate() {
            let page = tree::detached_page(&self.doc, page_id)?;
            documents.push(tree::isolate_from(&self.doc, &stale, vec![page])?);
            on_page(i);
        }
        Ok(documents)
    }

    /// Serialize a document, dropping objects no page refers to any more.
    pub fn to_bytes(doc: Document) -> Result<Vec<u8>> {
        tree::finish(doc)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16BE with BOM, otherwise treat as Latin-1
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_range;
    use crate::pdf::tree::test_support::{
        cross_linked_pdf, page_labels, page_objects, sample_pdf,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_count() {
        let doc = PdfDocument::from_bytes(&sample_pdf(4, "P")).unwrap();
        assert_eq!(doc.page_count(), 4);
        assert_eq!(doc.get_info().page_count, 4);
    }

    #[test]
    fn test_extract_keeps_selection_order() {
        let doc = PdfDocument::from_bytes(&sample_pdf(5, "E")).unwrap();
        let selection = page_range::parse("4,1-2", 5).unwrap();

        let extracted = doc.extract_pages(&selection, |_| {}).unwrap();
        let bytes = PdfDocument::to_bytes(extracted).unwrap();
        assert_eq!(page_labels(&bytes), vec!["E-4", "E-1", "E-2"]);
    }

    #[test]
    fn test_extract_keeps_duplicates() {
        let doc = PdfDocument::from_bytes(&sample_pdf(3, "D")).unwrap();
        let selection = page_range::parse("1,1-2", 3).unwrap();

        let extracted = doc.extract_pages(&selection, |_| {}).unwrap();
        let bytes = PdfDocument::to_bytes(extracted).unwrap();
        assert_eq!(page_labels(&bytes), vec!["D-1", "D-1", "D-2"]);
    }

    #[test]
    fn test_extracted_pages_keep_media_box() {
        let doc = PdfDocument::from_bytes(&sample_pdf(3, "M")).unwrap();
        let selection = page_range::parse("2", 3).unwrap();
        let extracted = doc.extract_pages(&selection, |_| {}).unwrap();
        let bytes = PdfDocument::to_bytes(extracted).unwrap();

        let out = Document::load_mem(&bytes).unwrap();
        let page_id = out.get_pages()[&1];
        let page = out.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn test_extract_drops_unselected_pages() {
        let source = cross_linked_pdf(20, "B");
        let doc = PdfDocument::from_bytes(&source).unwrap();

        for expression in ["1", "20", "3,5,3"] {
            let selection = page_range::parse(expression, 20).unwrap();
            let extracted = doc.extract_pages(&selection, |_| {}).unwrap();
            let bytes = PdfDocument::to_bytes(extracted).unwrap();
            assert_eq!(page_objects(&bytes), selection.len(), "{expression}");
            assert!(bytes.len() < source.len(), "{expression}");
        }
    }

    #[test]
    fn test_page_documents() {
        let doc = PdfDocument::from_bytes(&cross_linked_pdf(4, "S")).unwrap();
        let mut seen = Vec::new();
        let pages = doc.page_documents(|i| seen.push(i)).unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        for (n, page) in pages.into_iter().enumerate() {
            let bytes = PdfDocument::to_bytes(page).unwrap();
            assert_eq!(page_labels(&bytes), vec![format!("S-{}", n + 1)]);
            assert_eq!(page_objects(&bytes), 1);
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(PdfDocument::from_bytes(b"not a pdf").is_err());
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), Some("Hi".to_string()));
        assert_eq!(decode_pdf_string(b"Plain"), Some("Plain".to_string()));
    }
}
