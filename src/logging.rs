use tracing_subscriber::EnvFilter;

/// Log filter for a `-v` count when `RUST_LOG` is unset.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "posting_harvest=info,warn",
        1 => "posting_harvest=debug,warn",
        _ => "posting_harvest=trace,info",
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// the result preview and prompts.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
