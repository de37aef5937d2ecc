use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Cause, FetchError};
use crate::Result;

/// A fetched bulletin page, ready for attachment extraction.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    html: String,
}

impl Page {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Final URL of the page, after redirects. Relative links resolve against it.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Builds the client shared by page fetches and downloads.
/// Some servers reject requests without a browser-like identity, hence the user agent.
pub fn build_client(cfg: &ScraperConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .timeout(cfg.timeout())
        .connect_timeout(cfg.connect_timeout())
        .redirect(redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}

/// Requests a page and returns its HTML. Any non-2xx status is a failure.
pub async fn request_page_html(
    client: &Client,
    url: &str,
) -> core::result::Result<Page, FetchError> {
    let fail = |cause| FetchError {
        url: url.to_string(),
        cause,
    };

    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| fail(Cause::from_reqwest(&e)))?;

    let status = res.status();
    if !status.is_success() {
        return Err(fail(Cause::Status(status.as_u16())));
    }

    let final_url = res.url().clone();
    let html = res.text().await.map_err(|e| fail(Cause::from_reqwest(&e)))?;
    debug!("fetched {} ({} bytes)", final_url, html.len());

    Ok(Page::new(final_url, html))
}
