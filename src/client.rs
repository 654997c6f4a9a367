//! Batch orchestration over a scrape service
//!
//! URLs go through a worker pool of `workers` slots (1 by default, which is
//! strictly sequential). Results always come back in input order.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::{error, info, warn};

use crate::complaint::{ComplaintResult, UrlFailure};
use crate::error::ScraperError;
use crate::service::{ComplaintService, ScrapeRequest};

/// What a batch does when one URL fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure; no results are returned.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<ComplaintResult>,
    pub failures: Vec<UrlFailure>,
}

/// Trims entries and drops blank ones.
pub fn submitted_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ScrapeClient<S> {
    service: S,
    workers: usize,
    policy: FailurePolicy,
}

impl<S: ComplaintService> ScrapeClient<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            workers: 1,
            policy: FailurePolicy::default(),
        }
    }

    /// Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn analyze<U: AsRef<str>>(&self, urls: &[U]) -> Result<BatchOutcome, ScraperError> {
        let urls = submitted_urls(urls);
        let total = urls.len();
        info!(
            "Analyzing {} complaint(s) with {} worker(s), policy={:?}",
            total, self.workers, self.policy
        );

        let mut calls = stream::iter(urls.into_iter().map(|url| {
            let service = self.service.clone();
            async move {
                let result = service.oneshot(ScrapeRequest::new(url.clone())).await;
                (url, result)
            }
        }))
        .buffered(self.workers);

        let mut outcome = BatchOutcome::default();
        let mut done = 0;

        while let Some((url, result)) = calls.next().await {
            done += 1;
            match result {
                Ok(fields) => {
                    info!("[{}/{}] Scraped {}", done, total, url);
                    outcome.results.push(ComplaintResult::new(url, fields));
                }
                Err(e) => match self.policy {
                    FailurePolicy::Abort => {
                        error!("[{}/{}] Scrape failed for {}, aborting batch: {}", done, total, url, e);
                        return Err(ScraperError::BatchAborted {
                            url,
                            source: Box::new(e),
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!("[{}/{}] Scrape failed for {}, skipping: {}", done, total, url, e);
                        outcome.failures.push(UrlFailure {
                            url,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        info!(
            "Batch finished: {} scraped, {} failed",
            outcome.results.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
