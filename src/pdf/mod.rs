pub mod compress;
pub mod document;
pub mod images;
pub mod merge;
pub mod tree;

pub use document::PdfDocument;
