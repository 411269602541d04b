use anyhow::Result;
use regex::RegexBuilder;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chunk::{plan, write_chunks, ChunkRange, WrittenChunk};
use crate::pdf::toc::{build_tree, extract_toc, TocNode};
use crate::pdf::PdfDocument;
use crate::selection::Selector;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct SelectionParams {
    #[schemars(description = "Entry numbers from pdf_toc (e.g., '1,3', '2-5', '4-end')")]
    #[serde(default)]
    pub selection: Option<String>,
    #[schemars(description = "Select every top-level entry (default: false)")]
    #[serde(default)]
    pub all: bool,
    #[schemars(description = "Select every entry at this level, 1 being the top level")]
    #[serde(default)]
    pub level: Option<u32>,
    #[schemars(description = "Select entries whose title matches this case-insensitive regular expression")]
    #[serde(default)]
    pub title_pattern: Option<String>,
}

impl SelectionParams {
    fn selector(&self) -> Result<Selector> {
        let pattern = match &self.title_pattern {
            Some(p) => Some(
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| anyhow::anyhow!("Invalid regex: {}", e))?,
            ),
            None => None,
        };
        let selector = Selector {
            indices: self.selection.clone(),
            all: self.all,
            level: self.level,
            pattern,
        };
        if selector.is_empty() {
            anyhow::bail!("Nothing selected; give selection, all, level or title_pattern");
        }
        Ok(selector)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfChunkRangesRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[serde(flatten)]
    pub select: SelectionParams,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[serde(flatten)]
    pub select: SelectionParams,
    #[schemars(description = "Output directory (default: the directory of the source PDF)")]
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TocSplitServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl TocSplitServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for TocSplitServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl TocSplitServer {
    #[tool(description = "Get the numbered table of contents of a PDF, both as a flat list (use the index to select entries) and as a tree")]
    fn pdf_toc(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond(toc_result(&path))
    }

    #[tool(description = "Compute the page range each selected table of contents entry would be split into, without writing files")]
    fn pdf_chunk_ranges(&self, Parameters(req): Parameters<PdfChunkRangesRequest>) -> String {
        respond(chunk_ranges(&req))
    }

    #[tool(description = "Split a PDF into one file per selected table of contents entry. Each file is named <source name>_<title>.pdf")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        respond(split(&req))
    }
}

fn respond<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => format!("Error: {:#}", e),
    }
}

fn toc_result(path: &str) -> Result<TocResult> {
    let doc = PdfDocument::open(path)?;
    let entries = extract_toc(&doc.doc)?;
    let tree = build_tree(&entries);
    Ok(TocResult {
        page_count: doc.page_count(),
        entries: entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| TocEntryResult {
                index: i + 1,
                level: e.level,
                title: e.title,
                page: e.page,
            })
            .collect(),
        tree,
    })
}

fn chunk_ranges(req: &PdfChunkRangesRequest) -> Result<Vec<ChunkRange>> {
    let selector = req.select.selector()?;
    let doc = PdfDocument::open(&req.path)?;
    plan(&doc, &selector)
}

fn split(req: &PdfSplitRequest) -> Result<SplitResult> {
    let selector = req.select.selector()?;
    let doc = PdfDocument::open(&req.path)?;
    let chunks = plan(&doc, &selector)?;
    let files = write_chunks(&doc, &chunks, req.output_dir.as_deref().map(Path::new))?;
    Ok(SplitResult { files })
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct TocResult {
    pub page_count: u32,
    pub entries: Vec<TocEntryResult>,
    pub tree: Vec<TocNode>,
}

#[derive(Debug, Serialize)]
pub struct TocEntryResult {
    pub index: usize,
    pub level: u32,
    pub title: String,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SplitResult {
    pub files: Vec<WrittenChunk>,
}

impl ServerHandler for TocSplitServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Split PDFs along their table of contents. Use pdf_toc to list the numbered \
                 entries, pdf_chunk_ranges to preview the page range of each selected entry, \
                 and pdf_split to write one PDF per selected entry."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = TocSplitServer::new();
    tracing::info!("serving MCP on stdio");

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
