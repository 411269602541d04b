use crate::chunk::{plan, write_chunks};
use crate::cli::SplitArgs;
use crate::pdf::PdfDocument;
use crate::selection::Selector;
use anyhow::{Context, Result};
use regex::RegexBuilder;

pub fn run(args: SplitArgs) -> Result<()> {
    let pattern = args
        .pattern
        .as_deref()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(args.ignore_case)
                .build()
                .with_context(|| format!("Invalid title pattern: {}", p))
        })
        .transpose()?;

    let selector = Selector {
        indices: args.select,
        all: args.all,
        level: args.level,
        pattern,
    };
    if selector.is_empty() {
        anyhow::bail!("Nothing selected; pass --select, --all, --level or --match");
    }

    let doc = PdfDocument::open(&args.path)?;
    let chunks = plan(&doc, &selector)?;

    if args.dry_run {
        for chunk in &chunks {
            println!(
                "{}: pages {}-{}",
                chunk.title, chunk.start_page, chunk.end_page
            );
        }
        println!("\n{} chunk(s) planned.", chunks.len());
        return Ok(());
    }

    let written = write_chunks(&doc, &chunks, args.output_dir.as_deref())?;
    for w in &written {
        println!(
            "{}: pages {}-{} -> {}",
            w.range.title,
            w.range.start_page,
            w.range.end_page,
            w.path.display()
        );
    }
    println!("\nWrote {} chunk(s).", written.len());

    Ok(())
}
