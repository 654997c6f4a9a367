use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{info, warn};

use crate::complaint::{ComplaintFields, ComplaintScraper};
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

/// Scrape request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

pub type ScrapeFuture = Pin<Box<dyn Future<Output = Result<ComplaintFields, ScraperError>> + Send>>;

/// Anything that scrapes one complaint per request: the local browser
/// service, the remote HTTP client, or a test double.
pub trait ComplaintService:
    Service<ScrapeRequest, Response = ComplaintFields, Error = ScraperError, Future = ScrapeFuture>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ComplaintService for T where
    T: Service<ScrapeRequest, Response = ComplaintFields, Error = ScraperError, Future = ScrapeFuture>
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// tower::Service backed by a fresh headless Chromium per request
#[derive(Debug, Clone, Default)]
pub struct ScraperService {
    config: ScraperConfig,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ComplaintFields;
    type Error = ScraperError;
    type Future = ScrapeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("Scrape request received: url={}", req.url);
        let config = self.config.clone();

        Box::pin(async move {
            let timeout = config.timeout;
            let mut scraper = ComplaintScraper::new(config);

            // On timeout the execute future is dropped mid-flight; the scraper's Drop releases Chromium.
            let fields = match tokio::time::timeout(timeout, scraper.execute(&req.url)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Scrape of {} timed out after {:?}", req.url, timeout);
                    return Err(ScraperError::Timeout(format!(
                        "{} did not finish within {:?}",
                        req.url, timeout
                    )));
                }
            };

            info!(
                "Scrape finished: url={}, title_len={}, body_len={}",
                req.url,
                fields.title.len(),
                fields.complaint_text.len()
            );

            Ok(fields)
        })
    }
}
