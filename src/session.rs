//! Session-scoped state: the link list, the analyzing flag and the last results
//!
//! Results are held in memory only and replaced by each analysis.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::client::{BatchOutcome, ScrapeClient};
use crate::complaint::{ComplaintResult, UrlFailure};
use crate::error::ScraperError;
use crate::export;
use crate::links::LinkList;
use crate::service::ComplaintService;

/// Shared view of whether a batch is in flight.
#[derive(Debug, Clone, Default)]
pub struct AnalyzingFlag(Arc<AtomicBool>);

impl AnalyzingFlag {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sets the flag; it clears when the guard drops, including on error or cancellation.
    fn raise(&self) -> Option<AnalyzingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| AnalyzingGuard(self.0.clone()))
    }
}

struct AnalyzingGuard(Arc<AtomicBool>);

impl Drop for AnalyzingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct Session {
    links: LinkList,
    analyzing: AnalyzingFlag,
    results: Vec<ComplaintResult>,
    failures: Vec<UrlFailure>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(links: LinkList) -> Self {
        Self {
            links,
            ..Default::default()
        }
    }

    pub fn links(&self) -> &LinkList {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut LinkList {
        &mut self.links
    }

    pub fn analyzing(&self) -> &AnalyzingFlag {
        &self.analyzing
    }

    pub fn results(&self) -> &[ComplaintResult] {
        &self.results
    }

    pub fn failures(&self) -> &[UrlFailure] {
        &self.failures
    }

    /// Submission is disabled while analyzing or when the first link is blank.
    pub fn can_submit(&self) -> bool {
        !self.analyzing.get() && !self.links.first_is_blank()
    }

    pub fn can_export(&self) -> bool {
        !self.results.is_empty()
    }

    /// Runs the batch over the current links and replaces the stored results.
    /// An aborted batch leaves the results empty.
    pub async fn analyze<S: ComplaintService>(
        &mut self,
        client: &ScrapeClient<S>,
    ) -> Result<&[ComplaintResult], ScraperError> {
        if self.links.first_is_blank() {
            return Err(ScraperError::NothingToAnalyze);
        }
        let _guard = self.analyzing.raise().ok_or(ScraperError::AlreadyAnalyzing)?;

        self.results.clear();
        self.failures.clear();

        let BatchOutcome { results, failures } = client.analyze(self.links.as_slice()).await?;
        info!(
            "Session analysis complete: {} result(s), {} failure(s)",
            results.len(),
            failures.len()
        );

        self.results = results;
        self.failures = failures;
        Ok(&self.results)
    }

    /// Writes the current results as the fixed-name xlsx file in `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ScraperError> {
        if !self.can_export() {
            return Err(ScraperError::NothingToExport);
        }
        export::write_xlsx(&self.results, dir)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    use tower::Service;

    use super::*;
    use crate::client::test_support::RecordingService;
    use crate::client::FailurePolicy;
    use crate::complaint::ComplaintFields;
    use crate::service::{ScrapeFuture, ScrapeRequest};

    fn session_with(urls: &[&str]) -> Session {
        let (links, _) = LinkList::from_links(urls.iter().copied());
        Session::with_links(links)
    }

    /// Captures the analyzing flag as seen from inside a scrape call.
    #[derive(Clone)]
    struct FlagWatcher {
        flag: AnalyzingFlag,
        seen: Arc<Mutex<Vec<bool>>>,
    }

    impl Service<ScrapeRequest> for FlagWatcher {
        type Response = ComplaintFields;
        type Error = ScraperError;
        type Future = ScrapeFuture;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: ScrapeRequest) -> Self::Future {
            self.seen.lock().unwrap().push(self.flag.get());
            Box::pin(async { Ok(ComplaintFields::default()) })
        }
    }

    #[test]
    fn test_fresh_session_cannot_submit_or_export() {
        let session = Session::new();
        assert!(!session.can_submit());
        assert!(!session.can_export());
        assert!(!session.analyzing().get());
    }

    #[test]
    fn test_blank_first_link_disables_submit() {
        let session = session_with(&["   ", "https://x/2"]);
        assert!(!session.can_submit());

        let session = session_with(&["https://x/1", ""]);
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn test_analyze_with_blank_first_link_is_refused() {
        let service = RecordingService::default();
        let mut session = session_with(&["", "https://x/2"]);

        let result = session.analyze(&ScrapeClient::new(service.clone())).await;

        assert!(matches!(result, Err(ScraperError::NothingToAnalyze)));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_analyzing_flag_is_set_during_batch_only() {
        let mut session = session_with(&["https://x/1", "https://x/2"]);
        let watcher = FlagWatcher {
            flag: session.analyzing().clone(),
            seen: Arc::new(Mutex::new(Vec::new())),
        };

        session.analyze(&ScrapeClient::new(watcher.clone())).await.unwrap();

        assert_eq!(*watcher.seen.lock().unwrap(), vec![true, true]);
        assert!(!session.analyzing().get());
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn test_abort_policy_leaves_session_results_empty() {
        let mut session = session_with(&["https://x/1"]);
        let ok_client = ScrapeClient::new(RecordingService::default());
        session.analyze(&ok_client).await.unwrap();
        assert!(session.can_export());

        session.links_mut().add();
        session.links_mut().update(1, "https://unreachable.invalid");
        let failing = ScrapeClient::new(RecordingService::failing_on(&["https://unreachable.invalid"]));
        let result = session.analyze(&failing).await;

        assert!(matches!(result, Err(ScraperError::BatchAborted { .. })));
        assert!(session.results().is_empty());
        assert!(!session.can_export());
        assert!(!session.analyzing().get());
    }

    #[tokio::test]
    async fn test_skip_policy_records_failures_in_session() {
        let mut session = session_with(&["https://x/1", "https://unreachable.invalid", "https://x/3"]);
        let client = ScrapeClient::new(RecordingService::failing_on(&["https://unreachable.invalid"]))
            .with_policy(FailurePolicy::Skip);

        let results = session.analyze(&client).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(session.failures().len(), 1);
        assert_eq!(session.failures()[0].url, "https://unreachable.invalid");
    }

    #[tokio::test]
    async fn test_export_writes_results() {
        let mut session = session_with(&["https://x/1", "https://x/2"]);
        session.analyze(&ScrapeClient::new(RecordingService::default())).await.unwrap();

        let dir = std::env::temp_dir().join(format!("complaint-session-{}", std::process::id()));
        let path = session.export(&dir).unwrap();
        assert!(path.ends_with(export::EXPORT_FILENAME));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_without_results_is_refused() {
        let session = Session::new();
        let result = session.export(Path::new("."));
        assert!(matches!(result, Err(ScraperError::NothingToExport)));
    }
}
