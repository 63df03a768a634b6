//! Errors surfaced by the tool sessions.

use thiserror::Error;

use crate::collection::CollectionError;
use crate::page_range::RangeError;
use crate::pdf::images::LayoutError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("No input files")]
    NoInputFiles,

    /// A file of a kind the tool does not accept (e.g. an image given to merge)
    #[error("Unsupported file for this tool: {name}")]
    UnsupportedFile { name: String },

    /// The PDF engine has not been attached yet
    #[error("PDF processing library is not available yet, try again in a moment")]
    EngineUnavailable,

    /// Anything that failed inside the PDF or image libraries
    #[error("Processing failed: {source:#}")]
    Processing {
        #[source]
        source: anyhow::Error,
    },
}

impl ToolError {
    pub fn processing(source: anyhow::Error) -> Self {
        ToolError::Processing { source }
    }

    /// True for errors caused by user input rather than by the libraries.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            ToolError::Processing { .. } | ToolError::EngineUnavailable
        )
    }
}
