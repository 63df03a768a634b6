use tracing::info;

use super::{LoadedPdf, OutputArtifact, ProgressSink};
use crate::collection::NewFile;
use crate::engine::EngineSlot;
use crate::error::ToolError;
use crate::naming::{output_file_name, pdf_stem};
use crate::pdf::compress::reduction_percent;

const DEFAULT_NAME: &str = "compressed_document";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    pub reduction_percent: f64,
}

/// Holds one PDF and produces a smaller copy of it.
pub struct CompressSession {
    engine: EngineSlot,
    source: Option<LoadedPdf>,
    output_name: String,
    output: Option<OutputArtifact>,
}

impl CompressSession {
    pub fn new(engine: EngineSlot) -> Self {
        CompressSession {
            engine,
            source: None,
            output_name: DEFAULT_NAME.to_string(),
            output: None,
        }
    }

    pub fn load(&mut self, file: NewFile) -> Result<u32, ToolError> {
        let engine = self.engine.require()?;
        let loaded = LoadedPdf::load(file, engine)?;
        let total_pages = loaded.total_pages;

        self.clear();
        self.output_name = format!("compressed_{}", pdf_stem(&loaded.name));
        self.source = Some(loaded);
        Ok(total_pages)
    }

    pub fn source(&self) -> Option<&LoadedPdf> {
        self.source.as_ref()
    }

    pub fn set_output_name(&mut self, name: &str) {
        self.output_name = name.to_string();
        self.output = None;
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    pub fn clear(&mut self) -> Option<LoadedPdf> {
        self.output_name = DEFAULT_NAME.to_string();
        self.output = None;
        self.source.take()
    }

    /// Sizes before and after, once `compress` has run.
    pub fn stats(&self) -> Option<CompressionStats> {
        let source = self.source.as_ref()?;
        let output = self.output.as_ref()?;
        Some(CompressionStats {
            original_size: source.size_bytes,
            compressed_size: output.size(),
            reduction_percent: reduction_percent(source.size_bytes, output.size()),
        })
    }

    pub fn compress(&mut self, progress: ProgressSink<'_>) -> Result<&OutputArtifact, ToolError> {
        let source = self.source.as_ref().ok_or(ToolError::NoInputFiles)?;
        let engine = self.engine.require()?;

        progress(10);
        let bytes = engine.compress(&source.bytes).map_err(ToolError::processing)?;
        progress(90);

        info!(
            name = %source.name,
            original_bytes = source.size_bytes,
            compressed_bytes = bytes.len(),
            "compressed PDF"
        );
        let artifact = OutputArtifact {
            file_name: output_file_name(&self.output_name, DEFAULT_NAME),
            bytes,
        };
        progress(100);

        Ok(self.output.insert(artifact))
    }
}
