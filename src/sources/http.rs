use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;
const BODY_PREVIEW_CHARS: usize = 180;

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("strategist-income/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .context("failed building HTTP client")
}

pub async fn fetch_json(client: &Client, url: &str) -> Result<Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed GET request: {url}"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed reading response body: {url}"))?;
    if !status.is_success() {
        return Err(anyhow!("GET {url} returned {status}: {}", preview(&body)));
    }
    serde_json::from_str(&body).with_context(|| format!("invalid JSON response: {url}"))
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::{join_url, preview};

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(
            join_url("https://api.beefy.finance/", "/apy/breakdown"),
            "https://api.beefy.finance/apy/breakdown"
        );
        assert_eq!(
            join_url("https://api.beefy.finance", "tvl"),
            "https://api.beefy.finance/tvl"
        );
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(500);
        assert_eq!(preview(&body).len(), 180);
    }
}
