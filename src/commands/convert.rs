use anyhow::{bail, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::collection::FileKind;
use crate::engine::EngineSlot;
use crate::inputs;
use crate::naming::format_size;
use crate::pdf::images::PageLayout;
use crate::session::ConvertSession;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    paths: &[P],
    output: Q,
    layout: PageLayout,
) -> Result<()> {
    let files = inputs::gather(paths, FileKind::Image)?;
    if files.is_empty() {
        bail!("No images specified");
    }

    let mut session = ConvertSession::new(EngineSlot::lopdf());
    session.set_layout(layout)?;
    let outcome = session.add(files).into_result()?;
    for name in &outcome.rejected {
        warn!("Skipping {}: not an image", name);
    }

    let image_count = session.images().len();
    let artifact = session.convert(&mut |percent| debug!(percent, "converting"))?;
    let written = artifact.write_to(&output)?;

    println!(
        "Converted {} image(s) into {} ({})",
        image_count,
        written.display(),
        format_size(artifact.size())
    );

    Ok(())
}
