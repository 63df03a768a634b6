use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::collection::{FileKind, NewFile};

/// Resolve command-line inputs into files, keeping their order.
///
/// Directories contribute their files of `kind`, sorted by path. Plain files
/// are passed through whatever their kind, so the session can report them.
pub fn gather<P: AsRef<Path>>(inputs: &[P], kind: FileKind) -> Result<Vec<NewFile>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            for path in walk_sorted(input)? {
                let file = NewFile::from_path(&path)?;
                if file.kind == kind {
                    files.push(file);
                } else {
                    debug!(path = %path.display(), "ignoring file in directory");
                }
            }
        } else {
            files.push(NewFile::from_path(input)?);
        }
    }
    Ok(files)
}

fn walk_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}
