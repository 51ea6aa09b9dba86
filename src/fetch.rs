use crate::config::{FetchMode, LoadedConfig};
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub source_url: String,
    pub body: String,
}

pub fn fetch_listing_page(loaded: &LoadedConfig) -> Result<FetchedPage> {
    match loaded.config.fetch.mode {
        FetchMode::Http => fetch_http_page(loaded),
        FetchMode::File => fetch_file_page(loaded),
    }
}

fn fetch_http_page(loaded: &LoadedConfig) -> Result<FetchedPage> {
    let fetch = &loaded.config.fetch;
    let mut headers = HeaderMap::new();
    if let Some(user_agent) = &fetch.user_agent {
        let value = HeaderValue::from_str(user_agent)
            .with_context(|| format!("invalid fetch.user_agent {user_agent}"))?;
        headers.insert(USER_AGENT, value);
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .default_headers(headers)
        .build()
        .context("failed to build reqwest client")?;

    let url = &loaded.config.source.page_url;
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request to {url} failed"))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("request to {url} failed with status {status}");
    }
    let body = resp
        .text()
        .with_context(|| format!("failed to read body of {url}"))?;

    info!(
        source = %loaded.config.source.key,
        bytes = body.len(),
        url = %url,
        "fetched listings page"
    );

    Ok(FetchedPage {
        source_url: url.clone(),
        body,
    })
}

fn fetch_file_page(loaded: &LoadedConfig) -> Result<FetchedPage> {
    let resolved = loaded.page_file_path()?;
    let bytes = std::fs::read(&resolved)
        .with_context(|| format!("failed to read listings file {}", resolved.display()))?;

    info!(
        source = %loaded.config.source.key,
        file = %resolved.display(),
        bytes = bytes.len(),
        "loaded listings file"
    );

    Ok(FetchedPage {
        source_url: format!("file://{}", resolved.display()),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
