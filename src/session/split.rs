use tracing::info;

use super::{scaled, LoadedPdf, OutputArtifact, ProgressSink};
use crate::collection::NewFile;
use crate::engine::EngineSlot;
use crate::error::ToolError;
use crate::naming::{output_file_name, pdf_stem};
use crate::page_range::{self, PageSelection};

const DEFAULT_NAME: &str = "split_document";

/// Holds one PDF and extracts page selections from it.
pub struct SplitSession {
    engine: EngineSlot,
    source: Option<LoadedPdf>,
    range: String,
    output_name: String,
    /// The last result and the pages it holds.
    output: Option<(OutputArtifact, PageSelection)>,
}

impl SplitSession {
    pub fn new(engine: EngineSlot) -> Self {
        SplitSession {
            engine,
            source: None,
            range: String::new(),
            output_name: DEFAULT_NAME.to_string(),
            output: None,
        }
    }

    /// Replace the current document, returning its page count.
    pub fn load(&mut self, file: NewFile) -> Result<u32, ToolError> {
        let engine = self.engine.require()?;
        let loaded = LoadedPdf::load(file, engine)?;
        let total_pages = loaded.total_pages;

        self.clear();
        self.output_name = format!("split_{}", pdf_stem(&loaded.name));
        info!(name = %loaded.name, pages = total_pages, "loaded PDF for splitting");
        self.source = Some(loaded);
        Ok(total_pages)
    }

    pub fn source(&self) -> Option<&LoadedPdf> {
        self.source.as_ref()
    }

    pub fn total_pages(&self) -> u32 {
        self.source.as_ref().map_or(0, |s| s.total_pages)
    }

    pub fn range(&self) -> &str {
        &self.range
    }

    pub fn set_range(&mut self, range: &str) {
        self.range = range.to_string();
        self.output = None;
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn set_output_name(&mut self, name: &str) {
        self.output_name = name.to_string();
        self.output = None;
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref().map(|(artifact, _)| artifact)
    }

    /// Source page numbers of the current result, in output order.
    pub fn selection(&self) -> Option<&PageSelection> {
        self.output.as_ref().map(|(_, selection)| selection)
    }

    /// Forget the document, the range and any result.
    pub fn clear(&mut self) -> Option<LoadedPdf> {
        self.range.clear();
        self.output_name = DEFAULT_NAME.to_string();
        self.output = None;
        self.source.take()
    }

    /// Extract the pages named by the current range, in the order written.
    pub fn split(&mut self, progress: ProgressSink<'_>) -> Result<&OutputArtifact, ToolError> {
        let source = self.source.as_ref().ok_or(ToolError::NoInputFiles)?;
        let selection = page_range::parse(&self.range, source.total_pages)?;
        let engine = self.engine.require()?;

        // The source is already in memory, so reading and parsing are done.
        progress(20);
        progress(40);
        let total = selection.len();
        let bytes = engine
            .extract(&source.bytes, &selection, &mut |i| {
                progress(scaled(40, 50, i + 1, total))
            })
            .map_err(ToolError::processing)?;
        progress(95);

        info!(
            pages = total,
            input_bytes = source.size_bytes,
            output_bytes = bytes.len(),
            "extracted pages"
        );
        let artifact = OutputArtifact {
            file_name: output_file_name(&self.output_name, DEFAULT_NAME),
            bytes,
        };
        progress(100);

        Ok(&self.output.insert((artifact, selection)).0)
    }
}
