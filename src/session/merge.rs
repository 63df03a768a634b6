use tracing::info;

use super::{partition_kind, read_payloads, scaled, AddOutcome, OutputArtifact, ProgressSink};
use crate::collection::{
    CollectionError, FileId, FileKind, ManagedFile, NewFile, OrderedFileCollection,
};
use crate::engine::EngineSlot;
use crate::error::ToolError;
use crate::naming::output_file_name;

const DEFAULT_NAME: &str = "merged";

/// Gathers PDFs in a user-chosen order and merges them into one.
pub struct MergeSession {
    engine: EngineSlot,
    files: OrderedFileCollection,
    output_name: String,
    output: Option<OutputArtifact>,
}

impl MergeSession {
    pub fn new(engine: EngineSlot) -> Self {
        MergeSession {
            engine,
            files: OrderedFileCollection::new(),
            output_name: DEFAULT_NAME.to_string(),
            output: None,
        }
    }

    /// Add files; anything that is not a PDF is skipped and reported.
    pub fn add(&mut self, files: impl IntoIterator<Item = NewFile>) -> AddOutcome {
        let (pdfs, rejected) = partition_kind(files, FileKind::Pdf);
        let added = pdfs.len();
        if added > 0 {
            self.output = None;
        }
        AddOutcome {
            total_size: self.files.append(pdfs),
            added,
            rejected,
        }
    }

    pub fn remove(&mut self, id: FileId) -> Result<u64, CollectionError> {
        let total = self.files.remove(id)?;
        self.output = None;
        Ok(total)
    }

    pub fn move_up(&mut self, index: usize) -> Result<(), CollectionError> {
        self.files.move_up(index)?;
        self.output = None;
        Ok(())
    }

    pub fn move_down(&mut self, index: usize) -> Result<(), CollectionError> {
        self.files.move_down(index)?;
        self.output = None;
        Ok(())
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), CollectionError> {
        self.files.reorder(from, to)?;
        self.output = None;
        Ok(())
    }

    /// Drop every file and any result, returning the released entries.
    pub fn clear(&mut self) -> Vec<ManagedFile> {
        self.output = None;
        self.files.clear()
    }

    pub fn files(&self) -> &[ManagedFile] {
        self.files.snapshot()
    }

    pub fn total_size(&self) -> u64 {
        self.files.total_size()
    }

    pub fn set_output_name(&mut self, name: &str) {
        self.output_name = name.to_string();
        self.output = None;
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.as_ref()
    }

    /// Merge every file, in the current order.
    pub fn merge(&mut self, progress: ProgressSink<'_>) -> Result<&OutputArtifact, ToolError> {
        let engine = self.engine.require()?;
        let files = self.files.snapshot();
        if files.is_empty() {
            return Err(ToolError::NoInputFiles);
        }

        progress(0);
        let documents = read_payloads(files)?;

        let total = files.len();
        let mut merged_count = 0;
        let result = engine.merge(&documents, &mut |i| {
            merged_count = i + 1;
            progress(scaled(0, 90, merged_count, total));
        });
        let bytes = result.map_err(|e| {
            let e = match files.get(merged_count) {
                Some(failed) => e.context(format!("Error processing {}", failed.name)),
                None => e,
            };
            ToolError::processing(e)
        })?;
        progress(95);

        info!(
            files = total,
            input_bytes = self.files.total_size(),
            output_bytes = bytes.len(),
            "merged PDFs"
        );
        let artifact = OutputArtifact {
            file_name: output_file_name(&self.output_name, DEFAULT_NAME),
            bytes,
        };
        progress(100);

        Ok(self.output.insert(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tree::test_support::{page_labels, sample_pdf};
    use crate::session::test_support::broken;
    use pretty_assertions::assert_eq;

    fn pdf(name: &str, pages: u32) -> NewFile {
        NewFile::from_bytes(name, sample_pdf(pages, name))
    }

    fn session() -> MergeSession {
        MergeSession::new(EngineSlot::lopdf())
    }

    #[test]
    fn test_merge_follows_user_order() {
        let mut s = session();
        s.add([pdf("A", 1), pdf("B", 2), pdf("C", 1)]);
        s.move_up(2).unwrap();

        let mut seen = Vec::new();
        let out = s.merge(&mut |p| seen.push(p)).unwrap();
        assert_eq!(page_labels(&out.bytes), vec!["A-1", "C-1", "B-1", "B-2"]);
        assert_eq!(out.file_name, "merged.pdf");
        assert_eq!(seen, vec![0, 30, 60, 90, 95, 100]);
    }

    #[test]
    fn test_add_skips_non_pdf() {
        let mut s = session();
        let outcome = s.add([
            pdf("A", 1),
            NewFile::from_bytes("notes.txt", b"hello".to_vec()),
        ]);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.rejected, vec!["notes.txt".to_string()]);
        assert_eq!(outcome.total_size, s.files()[0].size_bytes);
        assert_eq!(s.files().len(), 1);
    }

    #[test]
    fn test_mutation_invalidates_output() {
        let mut s = session();
        s.add([pdf("A", 1), pdf("B", 1)]);
        s.merge(&mut |_| {}).unwrap();
        assert!(s.output().is_some());

        s.move_down(0).unwrap();
        assert!(s.output().is_none());

        s.merge(&mut |_| {}).unwrap();
        let id = s.files()[0].id;
        s.remove(id).unwrap();
        assert!(s.output().is_none());
    }

    #[test]
    fn test_remove_and_total() {
        let mut s = session();
        s.add([pdf("A", 1), pdf("B", 3)]);
        let b_size = s.files()[1].size_bytes;
        let a = s.files()[0].id;

        assert_eq!(s.remove(a).unwrap(), b_size);
        assert!(matches!(s.remove(a), Err(CollectionError::NotFound(_))));
        assert_eq!(s.total_size(), b_size);
    }

    #[test]
    fn test_empty_session_has_nothing_to_merge() {
        let mut s = session();
        assert!(matches!(s.merge(&mut |_| {}), Err(ToolError::NoInputFiles)));
    }

    #[test]
    fn test_engine_must_be_attached() {
        let mut s = MergeSession::new(EngineSlot::empty());
        s.add([pdf("A", 1)]);
        assert!(matches!(
            s.merge(&mut |_| {}),
            Err(ToolError::EngineUnavailable)
        ));
    }

    #[test]
    fn test_broken_input_names_file() {
        let mut s = session();
        s.add([
            pdf("good.pdf", 1),
            NewFile::from_bytes("bad.pdf", b"garbage".to_vec()),
        ]);
        let err = s.merge(&mut |_| {}).unwrap_err();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("bad.pdf"), "{err}");
    }

    #[test]
    fn test_engine_failure_is_processing_error() {
        let mut s = MergeSession::new(EngineSlot::ready(broken()));
        s.add([pdf("A", 1)]);
        let err = s.merge(&mut |_| {}).unwrap_err();
        assert!(matches!(err, ToolError::Processing { .. }));
        assert!(err.to_string().contains("merge exploded"));
    }

    #[test]
    fn test_custom_output_name() {
        let mut s = session();
        s.add([pdf("A", 1)]);
        s.set_output_name("quarterly report.pdf");
        assert_eq!(s.merge(&mut |_| {}).unwrap().file_name, "quarterly_report.pdf");
    }

    #[test]
    fn test_clear() {
        let mut s = session();
        s.add([pdf("A", 1), pdf("B", 1)]);
        let released = s.clear();
        assert_eq!(released.len(), 2);
        assert!(s.files().is_empty());
        assert_eq!(s.total_size(), 0);
    }
}
