//! Scraper for the monthly statistical bulletins of ANCPI.
//!
//! Builds the bulletin page URLs for a span of months, finds the spreadsheet
//! attachments on every page and downloads them under `<output>/<page-key>/`.

pub mod config;
pub mod download;
mod error;
pub mod filename;
pub mod logging;
mod macros;
pub mod parse;
pub mod process;
pub mod range;
pub mod report;
pub mod request;
pub mod retry;

pub use error::{Cause, DownloadError, Error, ExtractError, FetchError, Result, ValidationError};

/// Bulletin pages live at `{BASE_URL}-{month}-{year}`.
pub const BASE_URL: &str = "https://www.ancpi.ro/statistica";
/// Browser-like identity; the site rejects requests without one.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";
/// Element holding the attachment links on a bulletin page.
pub const CONTAINER_SELECTOR: &str = "div.download-attachments";
pub const DEFAULT_EXTENSION: &str = "xlsx";
