use crate::pdf::toc::extract_toc;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let entries = extract_toc(&doc.doc)?;

    if entries.is_empty() {
        println!("No table of contents found.");
        return Ok(());
    }

    println!("{} ({} pages)", path.as_ref().display(), doc.page_count());

    let width = entries.len().to_string().len();
    for (i, entry) in entries.iter().enumerate() {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        let page_str = entry
            .page
            .map(|p| format!(" (p. {})", p))
            .unwrap_or_default();
        println!("{:>width$}. {}{}{}", i + 1, indent, entry.title, page_str);
    }

    Ok(())
}
