use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::pdf::toc::{extract_toc, TocEntry};
use crate::pdf::PdfDocument;
use crate::selection::Selector;

const INVALID_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];
const MAX_TITLE_CHARS: usize = 100;

/// An inclusive, 1-based page span that becomes one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRange {
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
}

impl ChunkRange {
    pub fn page_count(&self) -> u32 {
        self.end_page - self.start_page + 1
    }
}

/// Compute the page span of every selected entry.
///
/// A chunk runs from its entry's page to one page before the next entry at
/// the same or a higher level (a smaller or equal level number), or to the
/// end of the document.
pub fn determine_chunk_ranges(entries: &[TocEntry], page_count: u32) -> Result<Vec<ChunkRange>> {
    if entries.is_empty() {
        anyhow::bail!("PDF has no table of contents");
    }
    if page_count == 0 {
        anyhow::bail!("PDF has no pages");
    }

    let last = i64::from(page_count);
    let mut chunks = Vec::new();

    for (idx, entry) in entries.iter().enumerate().filter(|(_, e)| e.selected) {
        let start = entry_page(entry);

        let end = entries[idx + 1..]
            .iter()
            .find(|next| next.level <= entry.level)
            .map(|next| entry_page(next) - 1)
            .unwrap_or(last);

        let start = start.clamp(1, last);
        let end = end.min(last).max(start);

        let chunk = ChunkRange {
            title: entry.title.clone(),
            start_page: start as u32,
            end_page: end as u32,
        };
        tracing::debug!(
            title = %chunk.title,
            start = chunk.start_page,
            end = chunk.end_page,
            "planned chunk"
        );
        chunks.push(chunk);
    }

    Ok(chunks)
}

/// Read the outline, apply the selector, and compute the chunk ranges.
pub fn plan(doc: &PdfDocument, selector: &Selector) -> Result<Vec<ChunkRange>> {
    let mut entries = extract_toc(&doc.doc)?;
    if entries.is_empty() {
        anyhow::bail!("PDF has no table of contents: {}", doc.path.display());
    }

    let selected = selector.apply(&mut entries)?;
    if selected == 0 {
        anyhow::bail!("No table of contents entries selected");
    }
    tracing::debug!(entries = entries.len(), selected, "selected entries");

    determine_chunk_ranges(&entries, doc.page_count())
}

// Unresolved destinations count as page 0 and get clamped by the caller.
fn entry_page(entry: &TocEntry) -> i64 {
    entry.page.map(i64::from).unwrap_or(0)
}

/// Make a chunk title safe to use inside a file name.
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        return "unnamed_section".to_string();
    }

    trimmed.chars().take(MAX_TITLE_CHARS).collect()
}

/// Where chunks go when no directory is given: next to the source file, or
/// the current directory if the source path has no directory part.
pub fn default_output_dir(source: &Path) -> Result<PathBuf> {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir().context("Failed to determine current directory"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenChunk {
    #[serde(flatten)]
    pub range: ChunkRange,
    pub path: PathBuf,
}

/// Write each chunk as `<stem>_<sanitized-title>.pdf` under `output_dir`.
///
/// Names repeated within one call get `_2`, `_3`, ... so that no chunk
/// overwrites another.
pub fn write_chunks(
    doc: &PdfDocument,
    chunks: &[ChunkRange],
    output_dir: Option<&Path>,
) -> Result<Vec<WrittenChunk>> {
    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_output_dir(&doc.path)?,
    };

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let stem = doc.stem();
    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let base = format!("{}_{}", stem, sanitize_filename(&chunk.title));
        let mut name = base.clone();
        let mut n = 1;
        while !used.insert(name.clone()) {
            n += 1;
            name = format!("{}_{}", base, n);
        }
        let output_path = output_dir.join(format!("{}.pdf", name));

        let mut new_doc = doc
            .extract_range(chunk.start_page, chunk.end_page)
            .with_context(|| format!("Failed to extract chunk '{}'", chunk.title))?;
        PdfDocument::save(&mut new_doc, &output_path)?;

        tracing::info!(
            title = %chunk.title,
            pages = chunk.page_count(),
            path = %output_path.display(),
            "wrote chunk"
        );

        written.push(WrittenChunk {
            range: chunk.clone(),
            path: output_path,
        });
    }

    Ok(written)
}
