//! The PDF libraries, behind a trait so sessions receive them explicitly.

use std::sync::Arc;

use anyhow::Result;

use crate::error::ToolError;
use crate::page_range::PageSelection;
use crate::pdf::images::PageLayout;
use crate::pdf::{compress, images, merge, PdfDocument};

pub trait PdfEngine: Send + Sync {
    fn page_count(&self, pdf: &[u8]) -> Result<u32>;

    /// `on_document` is called with the index of each input once it is merged in.
    fn merge(
        &self,
        documents: &[Vec<u8>],
        on_document: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>>;

    /// `on_page` is called with the position of each selected page once copied.
    fn extract(
        &self,
        pdf: &[u8],
        pages: &PageSelection,
        on_page: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>>;

    /// Every page as its own single-page PDF, from one parse of `pdf`.
    fn burst(&self, pdf: &[u8], on_page: &mut dyn FnMut(usize)) -> Result<Vec<Vec<u8>>>;

    /// `on_page` is called with the index of each image once its page is built.
    fn images_to_pdf(
        &self,
        images: &[Vec<u8>],
        layout: &PageLayout,
        on_page: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>>;

    fn compress(&self, pdf: &[u8]) -> Result<Vec<u8>>;
}

/// lopdf for documents, `image` for raster decoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl PdfEngine for LopdfEngine {
    fn page_count(&self, pdf: &[u8]) -> Result<u32> {
        Ok(PdfDocument::from_bytes(pdf)?.page_count())
    }

    fn merge(
        &self,
        documents: &[Vec<u8>],
        on_document: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>> {
        merge::merge_documents(documents, on_document)
    }

    fn extract(
        &self,
        pdf: &[u8],
        pages: &PageSelection,
        on_page: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>> {
        let doc = PdfDocument::from_bytes(pdf)?;
        PdfDocument::to_bytes(doc.extract_pages(pages, on_page)?)
    }

    fn burst(&self, pdf: &[u8], on_page: &mut dyn FnMut(usize)) -> Result<Vec<Vec<u8>>> {
        PdfDocument::from_bytes(pdf)?
            .page_documents(on_page)?
            .into_iter()
            .map(PdfDocument::to_bytes)
            .collect()
    }

    fn images_to_pdf(
        &self,
        images: &[Vec<u8>],
        layout: &PageLayout,
        on_page: &mut dyn FnMut(usize),
    ) -> Result<Vec<u8>> {
        images::images_to_pdf(images, layout, on_page)
    }

    fn compress(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        compress::compress_document(pdf)
    }
}

/// Holds the engine once it is available.
#[derive(Clone, Default)]
pub struct EngineSlot {
    engine: Option<Arc<dyn PdfEngine>>,
}

impl EngineSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ready(engine: Arc<dyn PdfEngine>) -> Self {
        EngineSlot {
            engine: Some(engine),
        }
    }

    pub fn lopdf() -> Self {
        Self::ready(Arc::new(LopdfEngine))
    }

    pub fn attach(&mut self, engine: Arc<dyn PdfEngine>) {
        self.engine = Some(engine);
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn require(&self) -> Result<&dyn PdfEngine, ToolError> {
        self.engine.as_deref().ok_or(ToolError::EngineUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_is_unavailable() {
        let slot = EngineSlot::empty();
        assert!(!slot.is_ready());
        assert!(matches!(slot.require(), Err(ToolError::EngineUnavailable)));
    }

    #[test]
    fn test_burst_parses_once_and_reports_pages() {
        let pdf = crate::pdf::tree::test_support::sample_pdf(3, "E");
        let mut seen = Vec::new();
        let pages = LopdfEngine.burst(&pdf, &mut |i| seen.push(i)).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_attach_makes_ready() {
        let mut slot = EngineSlot::empty();
        slot.attach(Arc::new(LopdfEngine));
        assert!(slot.is_ready());
        assert!(slot.require().is_ok());
    }
}
