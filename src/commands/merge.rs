use anyhow::{bail, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::collection::FileKind;
use crate::engine::EngineSlot;
use crate::inputs;
use crate::naming::format_size;
use crate::session::MergeSession;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(paths: &[P], output: Q) -> Result<()> {
    let files = inputs::gather(paths, FileKind::Pdf)?;
    if files.is_empty() {
        bail!("No input files specified");
    }

    let mut session = MergeSession::new(EngineSlot::lopdf());
    let outcome = session.add(files).into_result()?;
    for name in &outcome.rejected {
        warn!("Skipping {}: not a PDF", name);
    }

    let input_count = session.files().len();
    let artifact = session.merge(&mut |percent| debug!(percent, "merging"))?;
    let written = artifact.write_to(&output)?;

    println!(
        "Merged {} files ({}) into {} ({})",
        input_count,
        format_size(outcome.total_size),
        written.display(),
        format_size(artifact.size())
    );

    Ok(())
}
