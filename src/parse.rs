use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::ExtractError;
use crate::request::Page;
use crate::{Error, Result};

/// A downloadable file linked from a bulletin page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub title: String,
    pub download_url: Url,
}

/// Finds the attachment links inside the container element of a bulletin page.
#[derive(Debug, Clone)]
pub struct AttachmentExtractor {
    container: Selector,
    link: Selector,
}

impl AttachmentExtractor {
    pub fn new(container_selector: &str) -> Result<Self> {
        Ok(Self {
            container: create_selector(container_selector)?,
            link: create_selector("a[href]")?,
        })
    }

    /// Returns the attachments in document order.
    ///
    /// Only the first matching container is looked at. A link counts when it has
    /// both a label (its `title`, else its text) and a target that resolves to a URL.
    pub fn extract(&self, page: &Page) -> core::result::Result<Vec<Attachment>, ExtractError> {
        let doc = Html::parse_document(page.html());
        let container = doc
            .select(&self.container)
            .next()
            .ok_or(ExtractError::NoContainer)?;

        let attachments: Vec<_> = container
            .select(&self.link)
            .filter_map(|link| to_attachment(link, page.url()))
            .collect();

        if attachments.is_empty() {
            return Err(ExtractError::NoLinks);
        }
        Ok(attachments)
    }
}

fn to_attachment(link: ElementRef, base: &Url) -> Option<Attachment> {
    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let title = match link.value().attr("title").map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => link.text().collect::<String>().trim().to_string(),
    };
    if title.is_empty() {
        debug!("skipping unlabeled link: {href}");
        return None;
    }

    match base.join(href) {
        Ok(download_url) => Some(Attachment { title, download_url }),
        Err(e) => {
            debug!("skipping link with bad target {href}: {e}");
            None
        }
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}
