//! Web Scraping
//!
//! Fetches third-party pages and cuts answers out of them with fixed
//! substring markers. The markers track whatever the upstream sites emit
//! today; when a site renames a class the extraction simply comes back empty.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SEARCH_URL: &str = "https://www.google.com/search";

// Google likes to change these class names
const LINK_START: &str = "<div class=\"kCrYT\"><a href=";
const LINK_END: &str = "&amp;sa=U&amp;";
const IMAGE_START: &str = "<img class=\"t0fcAb\"";
const IMAGE_END: &str = "&amp;s";

pub const NHC_URL: &str = "https://www.nhc.noaa.gov/";
pub const NHC_FALLBACK_URL: &str = "https://protuhj.github.io/nhc-cones/atl_latest.png";
const NHC_CONTENT_START: &str = "<!-- START OF CONTENTS -->";
const NHC_CONTENT_END: &str = "<!-- END OF CONTENTS -->";

pub const UNPARSABLE_LINK: &str = "Cannot parse URI. Don't search for such silly nonsense.";

/// Scrape failures
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Expected markup not found: {0}")]
    MarkupNotFound(&'static str),
}

/// Source of raw page text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScrapeError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))
    }
}

/// Text between the first `start` and the following `end`, plus the offset
/// just past that text for the next search
fn find_between<'a>(source: &'a str, start: &str, end: &str) -> Option<(&'a str, usize)> {
    let from = source.find(start)? + start.len();
    let len = source[from..].find(end)?;
    Some((&source[from..from + len], from + len))
}

/// Like [`find_between`], trimmed to the first `http` and percent-decoded
fn find_link(source: &str, start: &str, end: &str) -> Option<(String, usize)> {
    let (raw, next) = find_between(source, start, end)?;
    let raw = raw.find("http").map(|i| &raw[i..]).unwrap_or(raw);
    let link = match urlencoding::decode(raw) {
        Ok(decoded) => html_entities_decode(&decoded),
        Err(_) => UNPARSABLE_LINK.to_string(),
    };
    Some((link, next))
}

/// Up to `limit` links found between repeated markers
fn collect_links(html: &str, start: &str, end: &str, limit: usize) -> Vec<String> {
    let mut links = Vec::new();
    let mut rest = html;
    while links.len() < limit {
        match find_link(rest, start, end) {
            Some((link, next)) => {
                links.push(link);
                rest = &rest[next..];
            }
            None => break,
        }
    }
    links
}

fn html_entities_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

pub fn search_url(query: &str, images: bool) -> String {
    let mut url = format!("{}?q={}", SEARCH_URL, urlencoding::encode(query));
    if images {
        url.push_str("&tbm=isch");
    }
    url
}

/// Result links from a search results page
pub fn extract_result_links(html: &str, limit: usize) -> Vec<String> {
    collect_links(html, LINK_START, LINK_END, limit)
}

/// Image links from an image search results page
pub fn extract_image_links(html: &str, limit: usize) -> Vec<String> {
    collect_links(html, IMAGE_START, IMAGE_END, limit)
}

/// Outlook map link from the NHC front page
pub fn extract_nhc_image(html: &str) -> Result<String, ScrapeError> {
    let start = html
        .find(NHC_CONTENT_START)
        .ok_or(ScrapeError::MarkupNotFound("contents start"))?;
    let end = html[start..]
        .find(NHC_CONTENT_END)
        .map(|i| start + i)
        .ok_or(ScrapeError::MarkupNotFound("contents end"))?;
    let content = &html[start..end];

    let tag_start = content
        .find("<img id=")
        .ok_or(ScrapeError::MarkupNotFound("img tag"))?;
    let tag_len = content[tag_start..]
        .find('>')
        .ok_or(ScrapeError::MarkupNotFound("img tag end"))?;
    let tag = &content[tag_start..tag_start + tag_len];

    let (src, _) = find_between(tag, "src=", "useMap=").ok_or(ScrapeError::MarkupNotFound("img src"))?;
    let path: String = src.trim().chars().filter(|c| *c != '\'' && *c != '"').collect();

    Ok(format!("https://www.nhc.noaa.gov{}", path))
}

/// Link search for the given query
pub async fn link_search(
    fetcher: &dyn PageFetcher,
    query: &str,
    limit: usize,
) -> Result<Vec<String>, ScrapeError> {
    info!("Link search: {:?} ({} results)", query, limit);
    let html = fetcher.fetch(&search_url(query, false)).await?;
    Ok(extract_result_links(&html, limit))
}

/// Image search for the given query
pub async fn image_search(
    fetcher: &dyn PageFetcher,
    query: &str,
    limit: usize,
) -> Result<Vec<String>, ScrapeError> {
    info!("Image search: {:?} ({} results)", query, limit);
    let html = fetcher.fetch(&search_url(query, true)).await?;
    Ok(extract_image_links(&html, limit))
}

/// Current Atlantic outlook image
pub async fn nhc_outlook(fetcher: &dyn PageFetcher) -> Result<String, ScrapeError> {
    let html = fetcher.fetch(NHC_URL).await?;
    extract_nhc_image(&html)
}
