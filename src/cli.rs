use std::path::PathBuf;

use chrono::{Datelike, Local};
use clap::Parser;

use ancpi_scrap::range::Span;
use ancpi_scrap::ValidationError;

const FIRST_YEAR: i32 = 2000;

/// Download the monthly ANCPI statistical bulletins.
#[derive(Debug, Parser)]
#[command(name = "ancpi-scrap", version)]
#[command(about = "Download the monthly ANCPI statistical bulletins", long_about = None)]
pub struct Args {
    /// First year to scrape.
    #[arg(long, value_parser = parse_year)]
    pub start_year: i32,

    /// Last year to scrape.
    #[arg(long, value_parser = parse_year)]
    pub end_year: i32,

    /// First month of the start year (1-12). Omit both months to scrape whole years.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub start_month: Option<u32>,

    /// Last month of the end year (1-12).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub end_month: Option<u32>,

    /// Directory the per-month folders are created in.
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Seconds to wait between two pages.
    #[arg(long, value_name = "SECS", value_parser = parse_delay)]
    pub delay: Option<f64>,

    /// TOML config file (base URL, timeouts, retry policy, ...).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Whole years when no month is given, otherwise a month span with the
    /// missing end filled in (January / December).
    pub fn span(&self) -> Result<Span, ValidationError> {
        match (self.start_month, self.end_month) {
            (None, None) => Span::years(self.start_year, self.end_year),
            (start, end) => Span::months(
                self.start_year,
                start.unwrap_or(1),
                self.end_year,
                end.unwrap_or(12),
            ),
        }
    }
}

fn parse_year(s: &str) -> Result<i32, String> {
    let year: i32 = s.parse().map_err(|_| format!("`{s}` isn't a year"))?;
    let current = Local::now().year();
    if (FIRST_YEAR..=current).contains(&year) {
        Ok(year)
    } else {
        Err(format!("year must be between {FIRST_YEAR} and {current}"))
    }
}

fn parse_delay(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(format!("`{s}` isn't a non-negative number of seconds")),
    }
}
