use anyhow::Result;
use clap::Parser;

use cohortly_cli::{Cli, Config};
use cohortly_core::SystemClock;

fn main() -> Result<()> {
    // Reports go to stdout, so logs stay on stderr. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cohortly=info".parse()?),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let stdout = std::io::stdout();
    cohortly_cli::run(&cli, config, &SystemClock, stdout.lock())?;
    Ok(())
}
