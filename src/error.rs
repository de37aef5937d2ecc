use std::error::Error as StdError;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors that end a run. Per-page and per-attachment failures never reach this type,
/// they are recorded in the [`Report`](crate::report::Report) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Couldn't parse the config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    InvalidSelector(String),

    #[error("Couldn't serialize the report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// A malformed date span. Raised before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start year {start} is after end year {end}")]
    YearOrder { start: i32, end: i32 },

    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u32),

    #[error("start month {start} is after end month {end} in {year}")]
    MonthOrder { year: i32, start: u32, end: u32 },
}

/// Why a single network operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Cause {
    #[error("timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(String),
}

impl Cause {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Cause::Timeout
        } else if let Some(status) = err.status() {
            Cause::Status(status.as_u16())
        } else if err.is_connect() {
            Cause::Connect(error_chain(err))
        } else {
            Cause::Transport(error_chain(err))
        }
    }

    pub fn io(err: std::io::Error) -> Self {
        Cause::Io(err.to_string())
    }
}

/// reqwest hides the interesting part (hyper, io) in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("couldn't fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: Cause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("the page has no attachment container")]
    NoContainer,

    #[error("the attachment container holds no links")]
    NoLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("couldn't download {url}: {cause}")]
pub struct DownloadError {
    pub url: String,
    pub cause: Cause,
}
