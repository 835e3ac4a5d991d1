//! Wolfram|Alpha Lookups
//!
//! Short plain-text answers and image answers for `!w` / `!wa`.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const SHORT_ANSWER_URL: &str = "https://api.wolframalpha.com/v1/result";
const QUERY_URL: &str = "https://api.wolframalpha.com/v2/query";

/// Pods worth showing, most useful first
const ANSWER_PODS: &[&str] = &["Result", "Current result", "Table", "Plot", "Plots"];

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No app id configured")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned {0}")]
    Status(u16),

    #[error("No answer in response")]
    NoAnswer,
}

/// Question answering service
#[async_trait]
pub trait AnswerLookup: Send + Sync {
    /// One-line textual answer
    async fn short_answer(&self, query: &str) -> Result<String, LookupError>;

    /// Link to an image rendering of the answer
    async fn simple_answer(&self, query: &str) -> Result<String, LookupError>;
}

/// Wolfram|Alpha API client
#[derive(Clone)]
pub struct WolframClient {
    client: Client,
    app_id: Option<String>,
}

impl WolframClient {
    pub fn new(app_id: Option<&str>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Request(e.to_string()))?;
        Ok(Self {
            client,
            app_id: app_id.map(String::from),
        })
    }

    pub fn is_available(&self) -> bool {
        self.app_id.is_some()
    }

    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, LookupError> {
        let app_id = self.app_id.as_deref().ok_or(LookupError::NotConfigured)?;

        let mut query = vec![("appid", app_id)];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))
    }
}

#[async_trait]
impl AnswerLookup for WolframClient {
    async fn short_answer(&self, query: &str) -> Result<String, LookupError> {
        debug!("Short answer lookup: {:?}", query);
        let answer = self.get(SHORT_ANSWER_URL, &[("i", query)]).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(LookupError::NoAnswer);
        }
        Ok(answer.to_string())
    }

    async fn simple_answer(&self, query: &str) -> Result<String, LookupError> {
        debug!("Image answer lookup: {:?}", query);
        let xml = self
            .get(QUERY_URL, &[("input", query), ("format", "image")])
            .await?;
        extract_pod_image(&xml).ok_or_else(|| {
            warn!("No usable pod in answer for {:?}", query);
            LookupError::NoAnswer
        })
    }
}

/// First image `src` inside the pod starting at `pod_start`
fn image_in_pod(xml: &str, pod_start: usize) -> Option<String> {
    let pod = &xml[pod_start..];
    let pod = &pod[..pod.find("</pod>").unwrap_or(pod.len())];

    let src_start = pod.find("src='")? + "src='".len();
    let src_len = pod[src_start..].find('\'')?;
    let link = pod[src_start..src_start + src_len].trim().replace("&amp;", "&");
    (!link.is_empty()).then_some(link)
}

/// Image link from a full query response
pub fn extract_pod_image(xml: &str) -> Option<String> {
    for title in ANSWER_PODS {
        if let Some(start) = xml.find(&format!("<pod title='{}'", title)) {
            if let Some(link) = image_in_pod(xml, start) {
                return Some(link);
            }
        }
    }

    // Otherwise the first pod that is not just the echoed input
    let mut offset = 0;
    while let Some(found) = xml[offset..].find("<pod title='") {
        let start = offset + found;
        let title_start = start + "<pod title='".len();
        let is_input = xml[title_start..].starts_with("Input");
        if !is_input {
            if let Some(link) = image_in_pod(xml, start) {
                return Some(link);
            }
        }
        offset = title_start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "<queryresult success='true'>\
        <pod title='Input interpretation' id='Input'><subpod><img src='https://www4b.wolframalpha.com/Calculate/MSP/MSP1?MSPStoreType=image/gif&amp;s=11' alt='x'/></subpod></pod>\
        <pod title='Result' id='Result'><subpod><img src='https://www4b.wolframalpha.com/Calculate/MSP/MSP2?MSPStoreType=image/gif&amp;s=11' alt='4'/></subpod></pod>\
        </queryresult>";

    #[test]
    fn test_result_pod_preferred() {
        assert_eq!(
            extract_pod_image(RESPONSE).as_deref(),
            Some("https://www4b.wolframalpha.com/Calculate/MSP/MSP2?MSPStoreType=image/gif&s=11")
        );
    }

    #[test]
    fn test_first_non_input_pod() {
        let xml = "<pod title='Input'><img src='in.gif'/></pod>\
            <pod title='Timeline'><img src='https://example.org/t.gif'/></pod>";
        assert_eq!(extract_pod_image(xml).as_deref(), Some("https://example.org/t.gif"));
    }

    #[test]
    fn test_no_pods() {
        assert_eq!(extract_pod_image("<queryresult success='false'/>"), None);
    }

    #[tokio::test]
    async fn test_missing_app_id() {
        let client = WolframClient::new(None, Duration::from_secs(1)).unwrap();
        assert!(!client.is_available());
        assert!(matches!(
            client.short_answer("2+2").await,
            Err(LookupError::NotConfigured)
        ));
    }
}
