use clap::Parser;
use meterlog::cli::Cli;

fn main() -> anyhow::Result<()> {
    meterlog::observability::init_tracing();
    Cli::parse().run()
}
