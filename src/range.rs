//! Turns a year/month span into the ordered list of bulletin page URLs.
//!
//! Every monthly bulletin lives at `{base}-{month name}-{year}`, with the month
//! name in Romanian. Nothing here touches the network.

use std::fmt;

use crate::error::ValidationError;

/// Month names as they appear in the page URLs. Index 0 is January.
pub const MONTHS_RO: [&str; 12] = [
    "ianuarie",
    "februarie",
    "martie",
    "aprilie",
    "mai",
    "iunie",
    "iulie",
    "august",
    "septembrie",
    "octombrie",
    "noiembrie",
    "decembrie",
];

/// Maps a 1-based month to its name. The only place where the month index is shifted.
#[inline]
fn month_name(month: u32) -> &'static str {
    MONTHS_RO[(month - 1) as usize]
}

fn check_month(month: u32) -> Result<u32, ValidationError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(ValidationError::MonthOutOfRange(month))
    }
}

/// An inclusive, validated year/month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    start_year: i32,
    start_month: u32,
    end_year: i32,
    end_month: u32,
}

impl DateSpan {
    pub fn new(
        start_year: i32,
        start_month: u32,
        end_year: i32,
        end_month: u32,
    ) -> Result<Self, ValidationError> {
        if start_year > end_year {
            return Err(ValidationError::YearOrder {
                start: start_year,
                end: end_year,
            });
        }
        check_month(start_month)?;
        check_month(end_month)?;
        if start_year == end_year && start_month > end_month {
            return Err(ValidationError::MonthOrder {
                year: start_year,
                start: start_month,
                end: end_month,
            });
        }
        Ok(Self {
            start_year,
            start_month,
            end_year,
            end_month,
        })
    }

    pub fn start(&self) -> (i32, u32) {
        (self.start_year, self.start_month)
    }

    pub fn end(&self) -> (i32, u32) {
        (self.end_year, self.end_month)
    }

    /// Number of calendar months covered, both ends included.
    pub fn month_count(&self) -> usize {
        let years = (self.end_year - self.start_year) as usize;
        years * 12 + self.end_month as usize + 1 - self.start_month as usize
    }

    /// First and last month of `year` that fall inside the span.
    fn months_in(&self, year: i32) -> (u32, u32) {
        let first = if year == self.start_year { self.start_month } else { 1 };
        let last = if year == self.end_year { self.end_month } else { 12 };
        (first, last)
    }
}

/// A validated range of whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSpan {
    start: i32,
    end: i32,
}

impl YearSpan {
    pub fn new(start: i32, end: i32) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::YearOrder { start, end });
        }
        Ok(Self { start, end })
    }
}

/// The two ways of asking for bulletins: whole years, or an exact month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Years(YearSpan),
    Months(DateSpan),
}

impl Span {
    pub fn years(start: i32, end: i32) -> Result<Self, ValidationError> {
        YearSpan::new(start, end).map(Span::Years)
    }

    pub fn months(
        start_year: i32,
        start_month: u32,
        end_year: i32,
        end_month: u32,
    ) -> Result<Self, ValidationError> {
        DateSpan::new(start_year, start_month, end_year, end_month).map(Span::Months)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Years(years) => write!(f, "{}..={}", years.start, years.end),
            Span::Months(span) => {
                let ((start_year, start_month), (end_year, end_month)) = (span.start(), span.end());
                write!(f, "{start_year}-{start_month:02}..={end_year}-{end_month:02}")
            }
        }
    }
}

/// URL of a single monthly bulletin page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    url: String,
}

impl PageUrl {
    fn new(base: &str, month_name: &str, year: i32) -> Self {
        Self {
            url: format!("{}-{month_name}-{year}", base.trim_end_matches('/')),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Last path segment of the URL, used as the per-month output directory.
    pub fn page_key(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.url)
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Generates the page URLs for `span` in ascending chronological order.
pub fn generate(base: &str, span: &Span) -> Vec<PageUrl> {
    match span {
        Span::Years(years) => (years.start..=years.end)
            .flat_map(|year| MONTHS_RO.iter().map(move |name| PageUrl::new(base, name, year)))
            .collect(),
        Span::Months(span) => {
            let mut urls = Vec::with_capacity(span.month_count());
            for year in span.start_year..=span.end_year {
                let (first, last) = span.months_in(year);
                for month in first..=last {
                    urls.push(PageUrl::new(base, month_name(month), year));
                }
            }
            urls
        }
    }
}
