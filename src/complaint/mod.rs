//! Complaint page scraping
//!
//! Loads a Reclame Aqui complaint page in headless Chromium and reads its
//! title, body and date.

mod network_idle;
mod scraper;
mod types;

pub use scraper::ComplaintScraper;
pub use types::{ComplaintFields, ComplaintResult, UrlFailure};
