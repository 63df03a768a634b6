use tracing::info;

use super::{partition_kind, read_payloads, scaled, AddOutcome, OutputArtifact, ProgressSink};
use crate::collection::{
    CollectionError, FileId, FileKind, ManagedFile, NewFile, OrderedFileCollection,
};
use crate::engine::EngineSlot;
use crate::error::ToolError;
use crate::naming::output_file_name;
use crate::pdf::images::PageLayout;

const DEFAULT_NAME: &str = "image-to-pdf";

/// Gathers images in order and lays them out one per page.
pub struct ConvertSession {
    engine: EngineSlot,
    images: OrderedFileCollection,
    layout: PageLayout,
    output_name: String,
    output: Option<OutputArtifact>,
}

impl ConvertSession {
    pub fn new(engine: EngineSlot) -> Self {
        ConvertSession {
            engine,
            images: OrderedFileCollection::new(),
            layout: PageLayout::default(),
            output_name: DEFAULT_NAME.to_string(),
            output: None,
        }
    }

    /// Add files; anything that is not an image is skipped and reported.
    pub fn add(&mut self, files: impl IntoIterator<Item = NewFile>) -> AddOutcome {
        let (images, rejected) = partition_kind(files, FileKind::Image);
        let added = images.len();
        if added > 0 {
            self.output = None;
        }
        AddOutcome {
            total_size: self.images.append(images),
            added,
            rejected,
        }
    }

    pub fn remove(&mut self, id: FileId) -> Result<u64, CollectionError> {
        let total = self.images.remove(id)?;
        self.output = None;
        Ok(total)
    }

    pub fn move_up(&mut self, index: usize) -> Result<(), CollectionError> {
        self.images.move_up(index)?;
        self.output = None;
        Ok(())
    }

    pub fn move_down(&mut self, index: usize) -> Result<(), CollectionError> {
        self.images.move_down(index)?;
        self.output = None;
        Ok(())
    }

    pub fn clear(&mut self) -> Vec<ManagedFile> {
        self.output = None;
        self.images.clear()
    }

    pub fn images(&self) -> &[ManagedFile] {
        self.images.snapshot()
    }

    pub fn total_size(&self) -> u64 {
        self.images.total_size()
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Replace the layout; an invalid one is rejected and the old one kept.
    pub fn set_layout(&mut self, layout: PageLayout) -> Result<(), ToolError> {
        layout.validate()?;
        self.layout = layout;
        self.output = None;
        Ok(())
    }

    pub fn set_output_name(&mut self, name: &str) {
        self.output_name = name.to_string();
        self.output = None;
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    pub fn convert(&mut self, progress: ProgressSink<'_>) -> Result<&OutputArtifact, ToolError> {
        let engine = self.engine.require()?;
        let files = self.images.snapshot();
        if files.is_empty() {
            return Err(ToolError::NoInputFiles);
        }

        progress(0);
        let images = read_payloads(files)?;

        let total = files.len();
        let mut built = 0;
        let result = engine.images_to_pdf(&images, &self.layout, &mut |i| {
            built = i + 1;
            progress(scaled(0, 90, built, total));
        });
        let bytes = result.map_err(|e| {
            let e = match files.get(built) {
                Some(failed) => e.context(format!("Error adding {} to PDF", failed.name)),
                None => e,
            };
            ToolError::processing(e)
        })?;
        progress(95);

        info!(images = total, output_bytes = bytes.len(), "converted images to PDF");
        let artifact = OutputArtifact {
            file_name: output_file_name(&self.output_name, DEFAULT_NAME),
            bytes,
        };
        progress(100);

        Ok(self.output.insert(artifact))
    }
}
