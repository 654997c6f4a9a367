//! HTTP front end
//!
//! `POST /api/scrape`, `POST /api/analyze` and `POST /api/export`, CORS open
//! to any origin. State is passed to handlers explicitly; nothing is global.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::client::{BatchOutcome, FailurePolicy, ScrapeClient};
use crate::complaint::{ComplaintFields, ComplaintResult};
use crate::config::ServerConfig;
use crate::error::ScraperError;
use crate::export::{self, EXPORT_FILENAME, XLSX_CONTENT_TYPE};
use crate::links::{LinkList, MAX_LINKS};
use crate::service::{ComplaintService, ScrapeRequest};

const SCRAPE_FAILED: &str = "Failed to scrape the complaint";

#[derive(Debug, Clone)]
pub struct AppState<S> {
    scraper: S,
    workers: usize,
    policy: FailurePolicy,
}

impl<S: ComplaintService> AppState<S> {
    pub fn new(scraper: S) -> Self {
        Self {
            scraper,
            workers: 1,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn client(&self) -> ScrapeClient<S> {
        ScrapeClient::new(self.scraper.clone())
            .with_workers(self.workers)
            .with_policy(self.policy)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error responses. The cause is logged, never sent to the caller.
#[derive(Debug)]
pub enum ApiError {
    ScrapeFailed,
    NothingToExport,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ScrapeFailed => (StatusCode::INTERNAL_SERVER_ERROR, SCRAPE_FAILED),
            ApiError::NothingToExport => (StatusCode::BAD_REQUEST, "Nothing to export"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build the export"),
        };
        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExportBody {
    results: Vec<ComplaintResult>,
}

pub fn router<S: ComplaintService>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/scrape", post(scrape::<S>))
        .route("/api/analyze", post(analyze::<S>))
        .route("/api/export", post(export_xlsx))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn scrape<S: ComplaintService>(
    State(state): State<AppState<S>>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<ComplaintFields>, ApiError> {
    match state.scraper.clone().oneshot(req.clone()).await {
        Ok(fields) => Ok(Json(fields)),
        Err(e) => {
            error!("Scraping error for {}: {}", req.url, e);
            Err(ApiError::ScrapeFailed)
        }
    }
}

async fn analyze<S: ComplaintService>(
    State(state): State<AppState<S>>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let (links, dropped) = LinkList::from_links(body.urls);
    if dropped > 0 {
        warn!("{} link(s) over the limit of {} were dropped", dropped, MAX_LINKS);
    }

    match state.client().analyze(links.as_slice()).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!("Error analyzing complaints: {}", e);
            Err(ApiError::ScrapeFailed)
        }
    }
}

async fn export_xlsx(Json(body): Json<ExportBody>) -> Result<Response, ApiError> {
    let bytes = export::to_xlsx(&body.results).map_err(|e| match e {
        ScraperError::NothingToExport => ApiError::NothingToExport,
        other => {
            error!("Export error: {}", other);
            ApiError::Internal
        }
    })?;

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Binds `0.0.0.0:port` and serves until Ctrl-C.
pub async fn serve<S: ComplaintService>(
    config: ServerConfig,
    state: AppState<S>,
) -> Result<(), ScraperError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on port {}", config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};

    use super::*;
    use crate::client::test_support::RecordingService;
    use crate::remote::HttpScrapeService;

    fn app(service: RecordingService) -> Router {
        router(AppState::new(service))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_scrape_success() {
        let response = app(RecordingService::default())
            .oneshot(post_json("/api/scrape", json!({ "url": "https://x/1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "title of https://x/1");
        assert_eq!(body["complaintText"], "body of https://x/1");
        assert_eq!(body["date"], "10/05/2024");
    }

    #[tokio::test]
    async fn test_scrape_failure_is_generic_500() {
        let service = RecordingService::failing_on(&["https://unreachable.invalid"]);
        let response = app(service)
            .oneshot(post_json("/api/scrape", json!({ "url": "https://unreachable.invalid" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body, json!({ "error": "Failed to scrape the complaint" }));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/scrape")
            .header(header::ORIGIN, "http://elsewhere.example")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "url": "https://x/1" }).to_string()))
            .unwrap();
        let response = app(RecordingService::default()).oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_analyze_skips_blank_urls() {
        let service = RecordingService::default();
        let response = app(service.clone())
            .oneshot(post_json(
                "/api/analyze",
                json!({ "urls": ["https://x/1", "", "https://x/2"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][1]["url"], "https://x/2");
        assert_eq!(service.calls(), vec!["https://x/1", "https://x/2"]);
    }

    #[tokio::test]
    async fn test_analyze_caps_batch_at_max_links() {
        let service = RecordingService::default();
        let urls: Vec<String> = (0..250).map(|i| format!("https://x/{}", i)).collect();
        let response = app(service.clone())
            .oneshot(post_json("/api/analyze", json!({ "urls": urls })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), MAX_LINKS);
        assert_eq!(body["results"][99]["url"], "https://x/99");
        assert_eq!(service.calls().len(), MAX_LINKS);
    }

    #[tokio::test]
    async fn test_analyze_abort_returns_500() {
        let service = RecordingService::failing_on(&["https://x/2"]);
        let response = app(service)
            .oneshot(post_json(
                "/api/analyze",
                json!({ "urls": ["https://x/1", "https://x/2"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_analyze_skip_policy_reports_failures() {
        let service = RecordingService::failing_on(&["https://x/2"]);
        let app = router(AppState::new(service).with_policy(FailurePolicy::Skip));
        let response = app
            .oneshot(post_json(
                "/api/analyze",
                json!({ "urls": ["https://x/1", "https://x/2", "https://x/3"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["failures"][0]["url"], "https://x/2");
    }

    #[tokio::test]
    async fn test_export_download() {
        let results = json!({ "results": [{
            "url": "https://x/1",
            "title": "Cobrança indevida",
            "complaintText": "Fui cobrado duas vezes.",
            "date": "02/02/2024"
        }]});
        let response = app(RecordingService::default())
            .oneshot(post_json("/api/export", results))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            XLSX_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"analise-reclame-aqui.xlsx\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn test_export_empty_is_bad_request() {
        let response = app(RecordingService::default())
            .oneshot(post_json("/api/export", json!({ "results": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remote_service_against_live_router() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = RecordingService::failing_on(&["https://unreachable.invalid"]);
        let app = app(backend);
        tokio::spawn(async move { axum::serve(listener, app).await });

        let remote = HttpScrapeService::new(&format!("http://{}", addr)).unwrap();

        let fields = remote
            .clone()
            .oneshot(ScrapeRequest::new("https://x/1"))
            .await
            .unwrap();
        assert_eq!(fields.title, "title of https://x/1");

        let err = remote
            .oneshot(ScrapeRequest::new("https://unreachable.invalid"))
            .await
            .unwrap_err();
        match err {
            ScraperError::Transport(message) => assert!(message.contains(SCRAPE_FAILED)),
            other => panic!("expected Transport error, got {:?}", other),
        }
    }
}
