//! PDF tools: merge, split, image-to-PDF and compression.
//!
//! The core pieces are the page range parser (`page_range`) and the ordered
//! file collection (`collection`). Sessions in `session` drive a `PdfEngine`
//! over them; `commands` and `mcp` are the CLI and MCP front ends.

pub mod collection;
pub mod commands;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod mcp;
pub mod naming;
pub mod page_range;
pub mod pdf;
pub mod session;

pub use error::ToolError;
pub use mcp::run_server;
