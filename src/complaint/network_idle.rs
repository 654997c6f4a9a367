//! Network idle detection from CDP network events
//!
//! Listeners must be attached before navigation so that requests started
//! during page load are counted.

use std::collections::HashSet;

use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::NetworkIdleConfig;
use crate::error::ScraperError;

/// Outstanding request bookkeeping
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    requests: HashSet<String>,
    max_in_flight: usize,
}

impl InFlight {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            requests: HashSet::new(),
            max_in_flight,
        }
    }

    /// Redirects reuse the request id, so a repeated start is not double counted.
    pub fn started(&mut self, request_id: &str) {
        self.requests.insert(request_id.to_string());
    }

    pub fn settled(&mut self, request_id: &str) {
        self.requests.remove(request_id);
    }

    pub fn is_quiet(&self) -> bool {
        self.requests.len() <= self.max_in_flight
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }
}

pub(crate) struct NetworkIdle {
    started: EventStream<EventRequestWillBeSent>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
    config: NetworkIdleConfig,
}

impl NetworkIdle {
    pub async fn attach(page: &Page, config: NetworkIdleConfig) -> Result<Self, ScraperError> {
        let listen_err = |e: chromiumoxide::error::CdpError| {
            ScraperError::BrowserInit(format!("network listener: {}", e))
        };

        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_err)?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_err)?;
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_err)?;

        Ok(Self {
            started,
            finished,
            failed,
            config,
        })
    }

    pub async fn wait(self) -> Result<(), ScraperError> {
        wait_on(
            self.started.map(|e| e.request_id.inner().clone()),
            self.finished.map(|e| e.request_id.inner().clone()),
            self.failed.map(|e| e.request_id.inner().clone()),
            self.config,
        )
        .await
    }
}

/// Resolves once the quiet window elapses with no network event and the
/// in-flight count at or below the limit. Each stream yields request ids.
/// Unbounded; callers apply the timeout.
pub(crate) async fn wait_on<A, B, C>(
    mut started: A,
    mut finished: B,
    mut failed: C,
    config: NetworkIdleConfig,
) -> Result<(), ScraperError>
where
    A: Stream<Item = String> + Unpin,
    B: Stream<Item = String> + Unpin,
    C: Stream<Item = String> + Unpin,
{
    let start = Instant::now();
    let mut in_flight = InFlight::new(config.max_in_flight);

    loop {
        let quiet = in_flight.is_quiet();

        tokio::select! {
            Some(id) = started.next() => in_flight.started(&id),
            Some(id) = finished.next() => in_flight.settled(&id),
            Some(id) = failed.next() => in_flight.settled(&id),
            _ = sleep(config.quiet_window), if quiet => {
                debug!(
                    "Network idle after {:?} ({} in flight)",
                    start.elapsed(),
                    in_flight.len()
                );
                return Ok(());
            }
            else => {
                return Err(ScraperError::Navigation(
                    "page event streams closed before network idle".into(),
                ));
            }
        }
    }
}
