use anyhow::{Context, Result};
use lopdf::Document;
use tracing::debug;

/// Structural compression: drop unreferenced objects and empty streams, then
/// deflate every stream. The input is returned as-is if that doesn't help.
pub fn compress_document(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes).context("Failed to parse PDF")?;

    let empty = doc.delete_zero_length_streams();
    let pruned = doc.prune_objects();
    doc.renumber_objects();
    doc.compress();
    debug!(
        empty_streams = empty.len(),
        pruned_objects = pruned.len(),
        "compressed document"
    );

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("Failed to serialize PDF")?;

    if buffer.len() >= bytes.len() {
        return Ok(bytes.to_vec());
    }
    Ok(buffer)
}

/// Percentage saved going from `original` to `compressed` bytes, never negative.
pub fn reduction_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 || compressed >= original {
        return 0.0;
    }
    (original - compressed) as f64 * 100.0 / original as f64
}
