//! Scrape service reached over HTTP (`POST /api/scrape` on a running server)

use std::task::{Context, Poll};

use serde::Deserialize;
use tower::Service;
use tracing::{debug, error};
use url::Url;

use crate::complaint::ComplaintFields;
use crate::error::ScraperError;
use crate::service::{ScrapeFuture, ScrapeRequest};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpScrapeService {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpScrapeService {
    /// `base` is the server root, e.g. `http://localhost:3000`. A path prefix
    /// such as `http://host/scraper` is kept, with or without a trailing slash.
    pub fn new(base: &str) -> Result<Self, ScraperError> {
        let endpoint = Url::parse(base)
            .and_then(|mut base| {
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                base.join("api/scrape")
            })
            .map_err(|e| ScraperError::Transport(format!("invalid server url {}: {}", base, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Service<ScrapeRequest> for HttpScrapeService {
    type Response = ComplaintFields;
    type Error = ScraperError;
    type Future = ScrapeFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        Box::pin(async move {
            debug!("POST {} url={}", endpoint, req.url);

            let response = client
                .post(endpoint.clone())
                .json(&req)
                .send()
                .await
                .map_err(|e| {
                    error!("Scrape service unreachable: {}", e);
                    ScraperError::Transport(e.to_string())
                })?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| "no error body".to_string());
                error!("Scrape service returned {} for {}: {}", status, req.url, message);
                return Err(ScraperError::Transport(format!("{}: {}", status, message)));
            }

            response
                .json::<ComplaintFields>()
                .await
                .map_err(|e| ScraperError::Transport(format!("invalid response body: {}", e)))
        })
    }
}
