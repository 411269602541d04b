use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tocsplit")]
#[command(about = "Split a PDF into smaller PDFs along its table of contents")]
#[command(version)]
pub struct Cli {
    /// Log more (-v: each written chunk, -vv: planning detail). RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Print the numbered table of contents
    Toc {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Write one PDF per selected table of contents entry
    #[command(alias = "chunk")]
    Split(SplitArgs),
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// PDF file to split
    pub path: PathBuf,

    /// Entry numbers from `tocsplit toc` (e.g., "1,3", "2-5", "4-end")
    #[arg(short, long)]
    pub select: Option<String>,

    /// Select every top-level entry
    #[arg(short, long)]
    pub all: bool,

    /// Select every entry at this level (1 = top level)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub level: Option<u32>,

    /// Select entries whose title matches this regular expression
    #[arg(short = 'm', long = "match", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Case insensitive title matching
    #[arg(short, long, requires = "pattern")]
    pub ignore_case: bool,

    /// Output directory (defaults to the directory of the PDF)
    #[arg(short, long, env = "TOCSPLIT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the page ranges without writing any files
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_split_selectors() {
        let cli = Cli::try_parse_from([
            "tocsplit", "split", "book.pdf", "-s", "1,3", "-l", "2", "-m", "^app", "-i", "-n",
        ])
        .unwrap();
        let Commands::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.path, PathBuf::from("book.pdf"));
        assert_eq!(args.select.as_deref(), Some("1,3"));
        assert_eq!(args.level, Some(2));
        assert_eq!(args.pattern.as_deref(), Some("^app"));
        assert!(args.ignore_case);
        assert!(args.dry_run);
        assert!(!args.all);
    }

    #[test]
    fn verbose_counts_anywhere() {
        let cli = Cli::try_parse_from(["tocsplit", "-v", "toc", "book.pdf", "-v"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["tocsplit", "toc", "book.pdf"]).unwrap();
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn level_zero_is_rejected() {
        assert!(Cli::try_parse_from(["tocsplit", "split", "book.pdf", "-l", "0"]).is_err());
    }
}
