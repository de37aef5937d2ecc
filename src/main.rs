use std::process::ExitCode;

use ancpi_scrap::config::ScraperConfig;
use ancpi_scrap::process::Scraper;
use ancpi_scrap::{info_time, logging, Error, Result};
use chrono::Local;
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod cli;

use crate::cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("ancpi-scrap error: {err}");
            match err {
                Error::Validation(_) | Error::Config(_) | Error::InvalidSelector(_) => {
                    ExitCode::from(2)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let start_time = Local::now();
    // Fail on a bad span before touching the network or the disk.
    let span = args.span()?;

    let mut config = match &args.config {
        Some(path) => ScraperConfig::load(path)?,
        None => ScraperConfig::default(),
    };
    if let Some(delay) = args.delay {
        config.page_delay_secs = delay;
    }

    tokio::fs::create_dir_all(&args.output_dir).await?;
    let scraper = Scraper::new(config)?;
    tracing::debug!("scraping {} into {}", scraper.config().base_url, args.output_dir.display());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupted, finishing the current request (Ctrl-C again to quit now)");
            cancel.cancel();
            // A forced exit can leave a `.part` file behind, never a partial destination.
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted again, exiting");
                std::process::exit(130);
            }
        }
    });

    let report = scraper.run(&span, &args.output_dir, &cancel).await;
    if let Some(path) = &args.report {
        report.write_json(path)?;
    }
    info_time!(start_time, "Full program time: {}", report);

    Ok(if report.cancelled {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    })
}
