use anyhow::{bail, Result};
use clap::ValueEnum;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::collection::{FileKind, NewFile};
use crate::commands::{burst::burst, info::report, split::default_dir};
use crate::engine::EngineSlot;
use crate::inputs;
use crate::pdf::images::{Orientation, PageLayout, PageSize};
use crate::session::{CompressSession, ConvertSession, MergeSession, SplitSession};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "PDF files or directories of PDFs, in merge order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path, or a directory to write merged.pdf into")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page selection (e.g., '1-3, 5, 2'); pages keep the order written")]
    pub pages: String,
    #[schemars(description = "Output file path (default: split_<name>.pdf next to the source)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfBurstRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Directory to write one PDF per page into")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImagesToPdfRequest {
    #[schemars(description = "Image files or directories of images, one page each, in order")]
    pub images: Vec<String>,
    #[schemars(description = "Output file path, or a directory to write image-to-pdf.pdf into")]
    pub output: String,
    #[schemars(description = "Page size: a4, a3, letter or legal (default: a4)")]
    #[serde(default)]
    pub page_size: Option<String>,
    #[schemars(description = "Orientation: portrait or landscape (default: portrait)")]
    #[serde(default)]
    pub orientation: Option<String>,
    #[schemars(description = "Margin in millimetres (default: 10)")]
    #[serde(default)]
    pub margin_mm: Option<f32>,
    #[schemars(description = "JPEG quality 1-100 for re-encoded images; JPEG inputs are embedded as-is (default: 100)")]
    #[serde(default)]
    pub quality: Option<u8>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfCompressRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Output file path (default: compressed_<name>.pdf next to the source)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including file size, title, author, creator, producer, dates, and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond(report(&path))
    }

    #[tool(description = "Merge PDFs into one file, keeping the order given. Directories contribute their PDFs sorted by path.")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        respond(merge(req))
    }

    #[tool(description = "Extract a page selection like '1-3, 5, 2' from a PDF into a new file. Pages appear in the order written, duplicates included.")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        respond(split(req))
    }

    #[tool(description = "Write every page of a PDF to its own file")]
    fn pdf_burst(&self, Parameters(req): Parameters<PdfBurstRequest>) -> String {
        respond(burst(&req.path, &req.output_dir).map(|files| BurstResult {
            page_count: files.len() as u32,
            files: files.iter().map(|f| f.display().to_string()).collect(),
        }))
    }

    #[tool(description = "Create a PDF with one image per page, fitted and centred on A4, A3, Letter or Legal pages")]
    fn images_to_pdf(&self, Parameters(req): Parameters<ImagesToPdfRequest>) -> String {
        respond(convert(req))
    }

    #[tool(description = "Rewrite a PDF without unused objects and with compressed streams, reporting the size reduction")]
    fn pdf_compress(&self, Parameters(req): Parameters<PdfCompressRequest>) -> String {
        respond(compress(req))
    }
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => {
            warn!("tool failed: {:#}", e);
            format!("Error: {:#}", e)
        }
    }
}

fn merge(req: PdfMergeRequest) -> Result<MergeResult> {
    let files = inputs::gather(&req.inputs, FileKind::Pdf)?;
    if files.is_empty() {
        bail!("No input files specified");
    }

    let mut session = MergeSession::new(EngineSlot::lopdf());
    let outcome = session.add(files).into_result()?;
    let file_count = session.files().len() as u32;

    let artifact = session.merge(&mut |percent| debug!(percent, "merging"))?;
    let written = artifact.write_to(&req.output)?;

    Ok(MergeResult {
        output_path: written.display().to_string(),
        file_count,
        input_size: outcome.total_size,
        output_size: artifact.size(),
        skipped: outcome.rejected,
    })
}

fn split(req: PdfSplitRequest) -> Result<SplitResult> {
    let source = Path::new(&req.path);
    let mut session = SplitSession::new(EngineSlot::lopdf());
    let total_pages = session.load(NewFile::from_path(source)?)?;
    session.set_range(&req.pages);

    let written = {
        let artifact = session.split(&mut |percent| debug!(percent, "splitting"))?;
        artifact.write_to(output_or_default(req.output, source))?
    };
    let page_count = session.selection().map_or(0, |pages| pages.len() as u32);

    Ok(SplitResult {
        output_path: written.display().to_string(),
        page_count,
        source_pages: total_pages,
    })
}

fn convert(req: ImagesToPdfRequest) -> Result<ConvertResult> {
    let files = inputs::gather(&req.images, FileKind::Image)?;
    if files.is_empty() {
        bail!("No input files specified");
    }

    let defaults = PageLayout::default();
    let layout = PageLayout {
        size: parse_choice::<PageSize>(req.page_size.as_deref())?.unwrap_or(defaults.size),
        orientation: parse_choice::<Orientation>(req.orientation.as_deref())?
            .unwrap_or(defaults.orientation),
        margin_mm: req.margin_mm.unwrap_or(defaults.margin_mm),
        quality: req.quality.unwrap_or(defaults.quality),
    };

    let mut session = ConvertSession::new(EngineSlot::lopdf());
    let outcome = session.add(files).into_result()?;
    session.set_layout(layout)?;
    let page_count = session.images().len() as u32;

    let artifact = session.convert(&mut |percent| debug!(percent, "converting"))?;
    let written = artifact.write_to(&req.output)?;

    Ok(ConvertResult {
        output_path: written.display().to_string(),
        page_count,
        output_size: artifact.size(),
        skipped: outcome.rejected,
    })
}

fn compress(req: PdfCompressRequest) -> Result<CompressResult> {
    let source = Path::new(&req.path);
    let mut session = CompressSession::new(EngineSlot::lopdf());
    session.load(NewFile::from_path(source)?)?;

    let written = {
        let artifact = session.compress(&mut |percent| debug!(percent, "compressing"))?;
        artifact.write_to(output_or_default(req.output, source))?
    };

    let Some(stats) = session.stats() else {
        bail!("Compression produced no result");
    };
    Ok(CompressResult {
        output_path: written.display().to_string(),
        original_size: stats.original_size,
        compressed_size: stats.compressed_size,
        reduction_percent: stats.reduction_percent,
    })
}

fn output_or_default(output: Option<String>, source: &Path) -> PathBuf {
    output.map(PathBuf::from).unwrap_or_else(|| default_dir(source))
}

/// An optional choice given by name, case-insensitively.
fn parse_choice<T: ValueEnum>(value: Option<&str>) -> Result<Option<T>> {
    value
        .map(|v| T::from_str(v, true).map_err(anyhow::Error::msg))
        .transpose()
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MergeResult {
    pub output_path: String,
    pub file_count: u32,
    pub input_size: u64,
    pub output_size: u64,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitResult {
    pub output_path: String,
    pub page_count: u32,
    pub source_pages: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BurstResult {
    pub page_count: u32,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ConvertResult {
    pub output_path: String,
    pub page_count: u32,
    pub output_size: u64,
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CompressResult {
    pub output_path: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub reduction_percent: f64,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF manipulation tools. Use pdf_info for metadata, pdf_merge to combine PDFs, \
                 pdf_split to extract a page selection, pdf_burst for one file per page, \
                 images_to_pdf to lay out images as pages, and pdf_compress to shrink a PDF."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();
    tracing::info!("starting MCP server on stdio");

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
