//! HTTP collaborators: the statistics API and binary artifact downloads.
//! The extraction layers never touch the network; they consume what these
//! return.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::info;

const ACCEPT_HEADER: &str = "application/json, text/xml;q=0.9, */*;q=0.8";
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
// Some hosts refuse non-browser agents for the bulletin artifacts.
const BROWSER_UA: &str = "Mozilla/5.0";

static PERIOD_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/p/[^/]+").unwrap());
static PERIOD_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/p/(\d{6})").unwrap());

/// A fetched response body plus its declared content type.
pub struct Payload {
    pub text: String,
    pub content_type: String,
}

pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// Replace the `/p/<...>` segment of an API URL with another period
/// selector (`202601`, `first`, `last`, ...).
pub fn with_period(url: &str, period: &str) -> Result<String> {
    if !PERIOD_SEGMENT_RE.is_match(url) {
        bail!("URL has no /p/ period segment: {}", url);
    }
    Ok(PERIOD_SEGMENT_RE
        .replace(url, format!("/p/{}", period))
        .into_owned())
}

/// The 6-digit period embedded in a configured URL.
pub fn period_from_url(url: &str) -> Result<String> {
    PERIOD_CODE_RE
        .captures(url)
        .map(|c| c[1].to_string())
        .with_context(|| format!("no 6-digit period in URL: {}", url))
}

pub async fn fetch_payload(client: &reqwest::Client, url: &str) -> Result<Payload> {
    info!("Fetching: {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
        .send()
        .await
        .with_context(|| format!("request failed: {}", url))?
        .error_for_status()
        .with_context(|| format!("request rejected: {}", url))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let text = response.text().await.context("failed to read body")?;
    Ok(Payload { text, content_type })
}

pub async fn download_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    info!("Downloading: {}", url);
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_UA)
        .send()
        .await
        .with_context(|| format!("download failed: {}", url))?
        .error_for_status()
        .with_context(|| format!("download rejected: {}", url))?;
    Ok(response.bytes().await.context("failed to read bytes")?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "https://apisidra.ibge.gov.br/values/t/1737/n1/all/v/all/p/202601/d/v63%202";

    #[test]
    fn with_period_replaces_segment() {
        let url = with_period(URL, "last").unwrap();
        assert!(url.contains("/p/last/"));
        assert!(!url.contains("/p/202601"));
    }

    #[test]
    fn with_period_requires_segment() {
        assert!(with_period("https://example.com/values/t/1737", "last").is_err());
    }

    #[test]
    fn period_from_url_extracts_code() {
        assert_eq!(period_from_url(URL).unwrap(), "202601");
    }

    #[test]
    fn period_from_url_requires_six_digits() {
        assert!(period_from_url("https://example.com/p/last/x").is_err());
    }
}
