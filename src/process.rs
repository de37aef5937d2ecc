use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{EmptyContainerPolicy, ScraperConfig};
use crate::download::download_file;
use crate::error::{Cause, ExtractError};
use crate::filename::normalize_title;
use crate::parse::{Attachment, AttachmentExtractor};
use crate::range::{generate, PageUrl, Span};
use crate::report::{DownloadResult, Outcome, Report, Stage};
use crate::request::{build_client, request_page_html};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::{info_time, Result};

/// Walks every bulletin page of a span: fetch, extract attachments, download them.
///
/// Pages and attachments are handled one at a time, in order. A failing page or
/// attachment is recorded in the [`Report`] and the run moves on.
pub struct Scraper {
    client: Client,
    extractor: AttachmentExtractor,
    retry: RetryPolicy,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            extractor: AttachmentExtractor::new(&config.container_selector)?,
            retry: config.retry_policy(),
            config,
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn page_urls(&self, span: &Span) -> Vec<PageUrl> {
        generate(&self.config.base_url, span)
    }

    /// Processes every page of `span`, writing files under `output_root/<page-key>/`.
    ///
    /// `cancel` is checked between pages and between attachments, and stops any
    /// further retries. A request in flight always finishes, so no partial file
    /// is left behind.
    pub async fn run(&self, span: &Span, output_root: &Path, cancel: &CancellationToken) -> Report {
        let start_time = Local::now();
        let urls = self.page_urls(span);
        info!("scraping {} pages for {}", urls.len(), span);

        let mut report = Report::default();
        for (i, page_url) in urls.iter().enumerate() {
            if i > 0 {
                if let Some(delay) = self.config.page_delay() {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
            if cancel.is_cancelled() {
                warn!("stopping before {}, {} pages left", page_url, urls.len() - i);
                report.cancelled = true;
                break;
            }

            let page_time = Local::now();
            self.process_page(page_url, output_root, cancel, &mut report).await;
            info_time!(page_time, "Processed page {}", page_url);
        }

        // Stopped in the middle of the last page's attachments.
        if cancel.is_cancelled() {
            report.cancelled = true;
        }

        info_time!(start_time, "Finished scraping: {}", report);
        report
    }

    async fn process_page(
        &self,
        page_url: &PageUrl,
        output_root: &Path,
        cancel: &CancellationToken,
        report: &mut Report,
    ) {
        let url = page_url.as_str();
        let client = &self.client;

        let fetched =
            run_with_retry(&self.retry, cancel, move || request_page_html(client, url)).await;
        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                warn!("{e}");
                report.page_failed(Stage::Fetch, url, &e.cause);
                return;
            }
        };

        let attachments = match self.extractor.extract(&page) {
            Ok(attachments) => attachments,
            Err(ExtractError::NoLinks)
                if self.config.empty_container == EmptyContainerPolicy::Skip =>
            {
                warn!("{url}: attachment container is empty, nothing to download");
                report.page_succeeded();
                return;
            }
            Err(e) => {
                warn!("{url}: {e}");
                report.page_failed(Stage::Extract, url, e);
                return;
            }
        };
        report.page_succeeded();
        info!("{url}: found {} attachments", attachments.len());

        let page_dir = output_root.join(page_url.page_key());
        let destinations = self.destinations(&page_dir, &attachments);

        for (attachment, destination) in attachments.iter().zip(destinations) {
            if cancel.is_cancelled() {
                break;
            }
            let result = self
                .download_attachment(attachment, &page_dir, destination, cancel)
                .await;
            match &result.outcome {
                Outcome::Success { bytes, .. } => {
                    info!("Downloaded: {} ({bytes} bytes)", result.destination.display())
                }
                Outcome::Failure { reason } => {
                    warn!("couldn't download {}: {reason}", result.source_url)
                }
            }
            report.record_download(result);
        }
    }

    /// `page_dir/<token>.<ext>` for each attachment, in order. Titles that normalize
    /// to the same token get `_2`, `_3`, ... so siblings never overwrite each other.
    fn destinations(&self, page_dir: &Path, attachments: &[Attachment]) -> Vec<PathBuf> {
        let mut used = HashSet::new();
        attachments
            .iter()
            .enumerate()
            .map(|(i, attachment)| {
                let mut token = normalize_title(&attachment.title);
                if token.is_empty() {
                    token = format!("attachment_{}", i + 1);
                }
                let mut candidate = token.clone();
                let mut n = 1;
                while !used.insert(candidate.clone()) {
                    n += 1;
                    candidate = format!("{token}_{n}");
                }
                page_dir.join(self.file_name(&candidate))
            })
            .collect()
    }

    fn file_name(&self, token: &str) -> String {
        let ext = self.config.extension.trim_start_matches('.');
        if ext.is_empty() {
            token.to_string()
        } else {
            format!("{token}.{ext}")
        }
    }

    async fn download_attachment(
        &self,
        attachment: &Attachment,
        page_dir: &Path,
        destination: PathBuf,
        cancel: &CancellationToken,
    ) -> DownloadResult {
        let source_url = attachment.download_url.as_str();
        let outcome = match tokio::fs::create_dir_all(page_dir).await {
            Err(e) => Outcome::Failure {
                reason: Cause::io(e).to_string(),
            },
            Ok(()) => {
                let client = &self.client;
                let dest = destination.as_path();
                let downloaded = run_with_retry(&self.retry, cancel, move || {
                    download_file(client, source_url, dest)
                })
                .await;
                match downloaded {
                    Ok(done) => Outcome::Success {
                        bytes: done.bytes,
                        remote_name: done.remote_name,
                    },
                    Err(e) => Outcome::Failure {
                        reason: e.cause.to_string(),
                    },
                }
            }
        };

        DownloadResult {
            source_url: source_url.to_string(),
            destination,
            outcome,
        }
    }
}
