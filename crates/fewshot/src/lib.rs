pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

/// Install the stderr log subscriber. `verbose` lowers the threshold from warnings to debug.
pub fn init(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
