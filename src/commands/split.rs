use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::collection::NewFile;
use crate::engine::EngineSlot;
use crate::naming::format_size;
use crate::session::SplitSession;

/// Extract the pages named by `pages` into a new PDF.
///
/// Without `output`, the result lands next to the input as `split_<name>.pdf`.
pub fn run<P: AsRef<Path>>(input: P, pages: &str, output: Option<PathBuf>) -> Result<()> {
    let input = input.as_ref();
    let mut session = SplitSession::new(EngineSlot::lopdf());
    let total_pages = session.load(NewFile::from_path(input)?)?;
    session.set_range(pages);

    let artifact = session.split(&mut |percent| debug!(percent, "splitting"))?;
    let target = output.unwrap_or_else(|| default_dir(input));
    let written = artifact.write_to(&target)?;

    println!(
        "Extracted pages {} of {} to {} ({})",
        pages.trim(),
        total_pages,
        written.display(),
        format_size(artifact.size())
    );

    Ok(())
}

pub(crate) fn default_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
