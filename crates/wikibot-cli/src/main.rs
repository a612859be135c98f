use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wikibot_cli::cli::Cli;
use wikibot_core::init_logging;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let target = cli.log_target()?;

    let _guard = match &target.file {
        Some(path) => Some(init_logging(path, &target.level)?),
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new(&target.level)),
                )
                .init();
            None
        }
    };

    tracing::debug!("wikibot CLI starting");
    Ok(ExitCode::from(cli.run()?))
}
