//! Reclame Aqui complaint scraper
//!
//! - Loads complaint pages in headless Chromium and extracts title, body and date
//! - Runs batches of links sequentially (or through a small worker pool)
//! - Exports the results to an xlsx spreadsheet
//! - Serves the same operations over HTTP
//!
//! # Scraping one page
//!
//! ```rust,ignore
//! use complaint_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::ServiceExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ScraperService::new(ScraperConfig::from_env());
//!     let fields = service
//!         .oneshot(ScrapeRequest::new("https://www.reclameaqui.com.br/empresa/reclamacao/"))
//!         .await
//!         .unwrap();
//!     println!("{}: {}", fields.title, fields.date);
//! }
//! ```
//!
//! # Analyzing a batch and exporting
//!
//! ```rust,ignore
//! use complaint_scraper::{LinkList, ScrapeClient, ScraperConfig, ScraperService, Session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (links, _) = LinkList::from_links(["https://x/1", "https://x/2"]);
//!     let mut session = Session::with_links(links);
//!     let client = ScrapeClient::new(ScraperService::new(ScraperConfig::default()));
//!
//!     session.analyze(&client).await.unwrap();
//!     let path = session.export(std::path::Path::new(".")).unwrap();
//!     println!("Saved {:?}", path);
//! }
//! ```

pub mod client;
pub mod complaint;
pub mod config;
pub mod error;
pub mod export;
pub mod links;
pub mod remote;
pub mod server;
pub mod service;
pub mod session;
pub mod traits;

pub use client::{BatchOutcome, FailurePolicy, ScrapeClient};
pub use complaint::{ComplaintFields, ComplaintResult, ComplaintScraper, UrlFailure};
pub use config::{NetworkIdleConfig, ScraperConfig, Selectors, ServerConfig};
pub use error::ScraperError;
pub use links::{LinkList, MAX_LINKS};
pub use remote::HttpScrapeService;
pub use server::AppState;
pub use service::{ComplaintService, ScrapeRequest, ScraperService};
pub use session::Session;
pub use traits::Scraper;
