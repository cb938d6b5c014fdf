//! Bulletin Fetcher
//!
//! Downloads the bulletin PDF from its upstream URL.

use async_trait::async_trait;
use cote_models::RawDocument;
use cote_utils::{FetchError, SourceConfig};
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;

/// Where the pipeline gets its document from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn url(&self) -> &str;

    async fn fetch(&self) -> Result<RawDocument, FetchError>;
}

/// Plain HTTP GET with a bounded timeout. Retrying is left to the scheduler.
pub struct HttpFetcher {
    client: Client,
    url: String,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            url: url.into(),
            clock,
        })
    }

    pub fn from_config(config: &SourceConfig, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        Self::new(config.url.clone(), config.timeout(), &config.user_agent, clock)
    }
}

#[async_trait]
impl DocumentSource for HttpFetcher {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/pdf, */*;q=0.8")
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.url, e))?;

        debug!(url = %self.url, bytes = bytes.len(), content_type = ?content_type, "Bulletin downloaded");

        Ok(RawDocument::new(bytes.to_vec(), self.url.clone(), self.clock.now()).with_content_type(content_type))
    }
}
