use anyhow::Context as _;
use tracing::level_filters::LevelFilter;

/// Default level for a number of `-v` flags.
fn default_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Log to stderr so stdout stays free for command output and the MCP transport.
///
/// `RUST_LOG` wins over the `-v` count when it is set.
pub fn init(verbose: u8) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .from_env()
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
