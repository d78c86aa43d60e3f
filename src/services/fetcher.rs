// src/services/fetcher.rs

//! Outbound page fetching.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// A fetched page with the URL it finally resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// URL after following redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl FetchedPage {
    /// A page that was served directly, without redirects.
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            body: body.into(),
        }
    }

    /// A page reached through redirects.
    pub fn redirected(url: impl Into<String>, final_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            final_url: final_url.into(),
            status: 200,
            body: String::new(),
        }
    }
}

/// Something that can GET a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Fetcher backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            log::debug!("{} answered {} (final url {})", url, status, final_url);
        }

        let body = response.text().await?;
        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}
