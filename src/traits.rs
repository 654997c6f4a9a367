use async_trait::async_trait;
use tracing::warn;

use crate::complaint::ComplaintFields;
use crate::error::ScraperError;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Launch the browser
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// Load `url` and extract the complaint fields
    async fn extract(&mut self, url: &str) -> Result<ComplaintFields, ScraperError>;

    /// Release the browser; safe to call when not initialized
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// initialize → extract → close. `close` runs on every path.
    async fn execute(&mut self, url: &str) -> Result<ComplaintFields, ScraperError> {
        let outcome = match self.initialize().await {
            Ok(()) => self.extract(url).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }

        outcome
    }
}
