use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("File not found in collection: {0}")]
    NotFound(FileId),

    #[error("Index {index} is out of bounds (collection holds {len} file(s))")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Opaque identity assigned when a file enters a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(Uuid);

impl FileId {
    fn generate() -> Self {
        FileId(Uuid::new_v4())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl FileKind {
    /// Sniff the leading bytes, falling back to the file extension.
    pub fn detect(name: &str, header: &[u8]) -> Self {
        if header.starts_with(b"%PDF-") {
            return FileKind::Pdf;
        }
        if image::guess_format(header).is_ok() {
            return FileKind::Image;
        }

        let path = Path::new(name);
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            FileKind::Pdf
        } else if image::ImageFormat::from_path(path).is_ok() {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }
}

/// Handle to the raw bytes of a file. Cloning shares, never copies.
#[derive(Debug, Clone)]
pub enum Payload {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl Payload {
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Path(path) => std::fs::read(path)
                .with_context(|| format!("Failed to read file: {}", path.display())),
            Payload::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// A file about to be added to a collection.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub size_bytes: u64,
    pub kind: FileKind,
    pub payload: Payload,
}

impl NewFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let size_bytes = file
            .metadata()
            .with_context(|| format!("Failed to stat file: {}", path.display()))?
            .len();

        let mut header = Vec::with_capacity(32);
        file.by_ref()
            .take(32)
            .read_to_end(&mut header)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(NewFile {
            kind: FileKind::detect(&name, &header),
            name,
            size_bytes,
            payload: Payload::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes: Arc<[u8]> = bytes.into();
        NewFile {
            kind: FileKind::detect(&name, &bytes[..bytes.len().min(32)]),
            size_bytes: bytes.len() as u64,
            name,
            payload: Payload::Memory(bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagedFile {
    pub id: FileId,
    pub name: String,
    pub size_bytes: u64,
    pub kind: FileKind,
    pub payload: Payload,
}

/// User-ordered list of input files.
///
/// The aggregate size is always derived from the held entries, so it cannot
/// disagree with them after any sequence of mutations.
#[derive(Debug, Default)]
pub struct OrderedFileCollection {
    files: Vec<ManagedFile>,
}

impl OrderedFileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files in the given order, returning the new aggregate size.
    pub fn append<I>(&mut self, files: I) -> u64
    where
        I: IntoIterator<Item = NewFile>,
    {
        self.files.extend(files.into_iter().map(|f| ManagedFile {
            id: FileId::generate(),
            name: f.name,
            size_bytes: f.size_bytes,
            kind: f.kind,
            payload: f.payload,
        }));
        self.total_size()
    }

    pub fn remove(&mut self, id: FileId) -> Result<u64, CollectionError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or(CollectionError::NotFound(id))?;
        self.files.remove(index);
        Ok(self.total_size())
    }

    /// Swap with the predecessor; no-op at index 0.
    pub fn move_up(&mut self, index: usize) -> Result<(), CollectionError> {
        self.check_index(index)?;
        if index > 0 {
            self.files.swap(index, index - 1);
        }
        Ok(())
    }

    /// Swap with the successor; no-op at the last index.
    pub fn move_down(&mut self, index: usize) -> Result<(), CollectionError> {
        self.check_index(index)?;
        if index + 1 < self.files.len() {
            self.files.swap(index, index + 1);
        }
        Ok(())
    }

    /// Move the entry at `from` so that it ends up at `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), CollectionError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let file = self.files.remove(from);
        self.files.insert(to, file);
        Ok(())
    }

    /// Empty the collection, handing back the released entries.
    pub fn clear(&mut self) -> Vec<ManagedFile> {
        std::mem::take(&mut self.files)
    }

    pub fn snapshot(&self) -> &[ManagedFile] {
        &self.files
    }

    pub fn get(&self, id: FileId) -> Option<&ManagedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), CollectionError> {
        if index < self.files.len() {
            Ok(())
        } else {
            Err(CollectionError::IndexOutOfBounds {
                index,
                len: self.files.len(),
            })
        }
    }
}
