use tracing_subscriber::EnvFilter;

/// Initialize tracing for the CLI. Quiet by default; turn up with e.g.
/// `RUST_LOG=meterlog=debug`. Logs go to stderr so `--json` output stays
/// pipeable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meterlog=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
