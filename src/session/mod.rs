//! Per-tool state: the inputs a user has gathered, progress, and the result.
//!
//! Each session owns its inputs exclusively and is driven by one caller at a
//! time. Any change to the inputs drops a previously produced result.

pub mod compress;
pub mod convert;
pub mod merge;
pub mod split;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::collection::{FileKind, ManagedFile, NewFile};
use crate::engine::PdfEngine;
use crate::error::ToolError;

pub use compress::CompressSession;
pub use convert::ConvertSession;
pub use merge::MergeSession;
pub use split::SplitSession;

/// Receives progress as a percentage in 0..=100.
pub type ProgressSink<'a> = &'a mut dyn FnMut(u8);

/// `done` out of `total` steps mapped onto `from..=from + span`.
pub(crate) fn scaled(from: u8, span: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return from;
    }
    let step = (span as usize * done.min(total)) / total;
    from + step as u8
}

/// A produced document, ready to be written wherever the user wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl OutputArtifact {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Write to `path`, or to `file_name` inside it when `path` is a directory.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let target = if path.is_dir() {
            path.join(&self.file_name)
        } else {
            path.to_path_buf()
        };
        std::fs::write(&target, &self.bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(target)
    }
}

/// Result of adding files to a session that only accepts one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub total_size: u64,
    pub added: usize,
    /// Names of files that were skipped because of their kind.
    pub rejected: Vec<String>,
}

impl AddOutcome {
    /// Fail when nothing at all could be added.
    pub fn into_result(self) -> Result<Self, ToolError> {
        match self.rejected.first() {
            Some(name) if self.added == 0 => Err(ToolError::UnsupportedFile {
                name: name.clone(),
            }),
            _ => Ok(self),
        }
    }
}

/// Split `files` into those of `kind` and the names of the rest.
pub(crate) fn partition_kind(
    files: impl IntoIterator<Item = NewFile>,
    kind: FileKind,
) -> (Vec<NewFile>, Vec<String>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for file in files {
        if file.kind == kind {
            accepted.push(file);
        } else {
            warn!(name = %file.name, "skipping file of unsupported type");
            rejected.push(file.name);
        }
    }
    (accepted, rejected)
}

/// Read every payload in order; a failure names the file.
pub(crate) fn read_payloads(files: &[ManagedFile]) -> Result<Vec<Vec<u8>>, ToolError> {
    files
        .iter()
        .map(|f| {
            f.payload
                .read()
                .with_context(|| format!("Error processing {}", f.name))
                .map_err(ToolError::processing)
        })
        .collect()
}

/// A single PDF loaded into memory, as used by the split and compress tools.
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    pub name: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
    pub total_pages: u32,
}

impl LoadedPdf {
    pub(crate) fn load(file: NewFile, engine: &dyn PdfEngine) -> Result<Self, ToolError> {
        if file.kind != FileKind::Pdf {
            return Err(ToolError::UnsupportedFile { name: file.name });
        }
        let bytes = file.payload.read().map_err(ToolError::processing)?;
        let total_pages = engine
            .page_count(&bytes)
            .with_context(|| format!("Failed to load {}", file.name))
            .map_err(ToolError::processing)?;

        Ok(LoadedPdf {
            name: file.name,
            size_bytes: bytes.len() as u64,
            bytes,
            total_pages,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use anyhow::{bail, Result};

    use crate::engine::PdfEngine;
    use crate::page_range::PageSelection;
    use crate::pdf::images::PageLayout;

    /// Engine whose every operation fails, for the "library error" path.
    pub struct BrokenEngine;

    impl PdfEngine for BrokenEngine {
        fn page_count(&self, _: &[u8]) -> Result<u32> {
            Ok(3)
        }

        fn merge(&self, _: &[Vec<u8>], _: &mut dyn FnMut(usize)) -> Result<Vec<u8>> {
            bail!("merge exploded")
        }

        fn extract(
            &self,
            _: &[u8],
            _: &PageSelection,
            _: &mut dyn FnMut(usize),
        ) -> Result<Vec<u8>> {
            bail!("extract exploded")
        }

        fn burst(&self, _: &[u8], _: &mut dyn FnMut(usize)) -> Result<Vec<Vec<u8>>> {
            bail!("burst exploded")
        }

        fn images_to_pdf(
            &self,
            _: &[Vec<u8>],
            _: &PageLayout,
            _: &mut dyn FnMut(usize),
        ) -> Result<Vec<u8>> {
            bail!("convert exploded")
        }

        fn compress(&self, _: &[u8]) -> Result<Vec<u8>> {
            bail!("compress exploded")
        }
    }

    pub fn broken() -> Arc<dyn PdfEngine> {
        Arc::new(BrokenEngine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scaled() {
        assert_eq!(scaled(0, 90, 0, 4), 0);
        assert_eq!(scaled(0, 90, 1, 4), 22);
        assert_eq!(scaled(0, 90, 4, 4), 90);
        assert_eq!(scaled(40, 50, 2, 3), 73);
        assert_eq!(scaled(40, 50, 9, 3), 90);
        assert_eq!(scaled(40, 50, 0, 0), 40);
    }

    #[test]
    fn test_add_outcome_all_rejected_is_error() {
        let outcome = AddOutcome {
            total_size: 0,
            added: 0,
            rejected: vec!["a.txt".into()],
        };
        assert!(matches!(
            outcome.into_result(),
            Err(ToolError::UnsupportedFile { name }) if name == "a.txt"
        ));
    }

    #[test]
    fn test_add_outcome_partial_is_ok() {
        let outcome = AddOutcome {
            total_size: 10,
            added: 1,
            rejected: vec!["a.txt".into()],
        };
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_artifact_write_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = OutputArtifact {
            file_name: "out.pdf".into(),
            bytes: b"%PDF-1.7".to_vec(),
        };
        let written = artifact.write_to(dir.path()).unwrap();
        assert_eq!(written, dir.path().join("out.pdf"));
        assert_eq!(std::fs::read(written).unwrap(), b"%PDF-1.7".to_vec());
        assert_eq!(artifact.size(), 8);
    }
}
