use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::{FetchError, MetadataFetcher, PageMetadata};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page bytes read before parsing; the tags we want live in `<head>`.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// Some sites only serve Open Graph tags to browser-looking clients.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches a page over HTTP and reads its Open Graph tags.
#[derive(Clone)]
pub struct OpenGraphFetcher {
    client: reqwest::Client,
}

impl OpenGraphFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for OpenGraphFetcher {
    async fn fetch(&self, url: &str) -> Result<PageMetadata, FetchError> {
        let page_url = Url::parse(url)?;
        let response = self.client.get(page_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Redirects may have moved us; relative image paths resolve against
        // where the page actually came from.
        let final_url = response.url().clone();
        let body = read_capped(response, MAX_BODY_BYTES).await?;

        let metadata = parse_metadata(&body, Some(&final_url));
        debug!("Fetched metadata for {}: {:?}", url, metadata.title);
        Ok(metadata)
    }
}

/// Read at most `cap` bytes of the body and drop the rest of the stream.
async fn read_capped(mut response: reqwest::Response, cap: usize) -> Result<String, FetchError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = cap - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!("Truncated {} at {} bytes", response.url(), cap);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Pull title, description and first image out of an HTML document,
/// preferring Open Graph tags over plain `<title>` / `meta[name=description]`.
pub fn parse_metadata(html: &str, base: Option<&Url>) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .or_else(|| element_text(&document, "title"))
        .unwrap_or_default();

    let description = meta_content(&document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(&document, r#"meta[name="description"]"#))
        .unwrap_or_default();

    let image_url = meta_content(&document, r#"meta[property="og:image"]"#)
        .or_else(|| meta_content(&document, r#"meta[property="og:image:url"]"#))
        .map(|src| resolve(&src, base))
        .unwrap_or_default();

    PageMetadata {
        title,
        description,
        image_url,
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn resolve(src: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(src)
            .map(String::from)
            .unwrap_or_else(|_| src.to_string()),
        None => src.to_string(),
    }
}
