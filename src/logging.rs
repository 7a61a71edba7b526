use anyhow::Result;
use tracing_subscriber::fmt::format::FmtSpan;

pub(crate) struct Options {
    pub verbose: bool,
    pub color: bool,
}

/// Install the global stderr subscriber.
///
/// Quiet by default: only warnings reach the terminal, since the CLI prints
/// its own per-plan report on stdout.
pub(crate) fn set_up(options: &Options) -> Result<()> {
    let (level, span_events) = if options.verbose {
        (tracing::Level::DEBUG, FmtSpan::NEW | FmtSpan::CLOSE)
    } else {
        (tracing::Level::WARN, FmtSpan::NONE)
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_span_events(span_events)
        .with_ansi(options.color)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to set up tracing: {}", e))?;

    Ok(())
}
