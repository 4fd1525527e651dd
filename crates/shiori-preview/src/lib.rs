//! Link previews: Open Graph metadata for a submitted URL, plus the fallback
//! record used when the page cannot be fetched.

pub mod opengraph;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

pub use opengraph::OpenGraphFetcher;

const FAVICON_ENDPOINT: &str = "https://www.google.com/s2/favicons";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// What a page says about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageMetadata, FetchError>;
}

/// Preview fields stored on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPreview {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub domain: String,
}

/// Fetch metadata for `url`, degrading instead of failing: the title falls
/// back to the URL itself and a missing image to the site's favicon.
pub async fn resolve_preview(fetcher: &dyn MetadataFetcher, url: &str) -> LinkPreview {
    let metadata = match fetcher.fetch(url).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Metadata fetch failed for {}: {}", url, e);
            PageMetadata::default()
        }
    };

    let domain = extract_domain(url);
    let title = if metadata.title.trim().is_empty() {
        url.to_string()
    } else {
        metadata.title
    };
    let image_url = if metadata.image_url.is_empty() {
        favicon_url(&domain).unwrap_or_default()
    } else {
        metadata.image_url
    };

    LinkPreview {
        title,
        description: metadata.description,
        image_url,
        domain,
    }
}

/// Host of `url` without a leading `www.`; empty if the URL does not parse.
/// IPv6 literals come back without their brackets.
pub fn extract_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    match parsed.host() {
        Some(Host::Domain(host)) => host.strip_prefix("www.").unwrap_or(host).to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    }
}

pub fn favicon_url(domain: &str) -> Option<String> {
    if domain.is_empty() {
        return None;
    }
    Url::parse_with_params(FAVICON_ENDPOINT, &[("domain", domain), ("sz", "128")])
        .ok()
        .map(String::from)
}
