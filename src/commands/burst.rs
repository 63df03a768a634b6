use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::EngineSlot;
use crate::pdf::PdfDocument;

/// Write every page to its own file, `<stem>_0001.pdf` and so on.
pub fn burst<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output_dir: Q) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to open PDF: {}", input.display()))?;
    let engine = EngineSlot::lopdf();
    let pages = engine
        .require()?
        .burst(&bytes, &mut |i| debug!(page = i + 1, "split page"))
        .with_context(|| format!("Failed to split {}", input.display()))?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");

    let mut written = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        let output_path = output_dir.join(format!("{}_{:04}.pdf", stem, i + 1));
        PdfDocument::save(page, &output_path)?;
        written.push(output_path);
    }

    Ok(written)
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output_dir: Q) -> Result<()> {
    let written = burst(input, &output_dir)?;
    println!(
        "Split {} pages into {}",
        written.len(),
        output_dir.as_ref().display()
    );
    Ok(())
}
