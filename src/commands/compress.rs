use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::split::default_dir;
use crate::collection::NewFile;
use crate::engine::EngineSlot;
use crate::naming::format_size;
use crate::session::CompressSession;

pub fn run<P: AsRef<Path>>(input: P, output: Option<PathBuf>) -> Result<()> {
    let input = input.as_ref();
    let mut session = CompressSession::new(EngineSlot::lopdf());
    session.load(NewFile::from_path(input)?)?;

    let written = {
        let artifact = session.compress(&mut |percent| debug!(percent, "compressing"))?;
        let target = output.unwrap_or_else(|| default_dir(input));
        artifact.write_to(&target)?
    };

    if let Some(stats) = session.stats() {
        println!("Original size: {}", format_size(stats.original_size));
        println!("Compressed size: {}", format_size(stats.compressed_size));
        println!("Reduction: {:.1}%", stats.reduction_percent);
    }
    println!("Saved to {}", written.display());

    Ok(())
}
