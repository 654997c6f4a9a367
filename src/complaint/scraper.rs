//! Complaint page scraper
//!
//! One browser per scrape: launch Chromium with a throwaway profile, load
//! the page, wait for network idle, read the three complaint fields.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{ScraperConfig, Selectors};
use crate::error::ScraperError;
use crate::traits::Scraper;

use super::network_idle::NetworkIdle;
use super::types::{ComplaintFields, RawFields};

const CDP_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentInfo {
    href: String,
    content_type: String,
}

pub struct ComplaintScraper {
    config: ScraperConfig,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: Option<PathBuf>,
}

impl ComplaintScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
            handler: None,
            user_data_dir: None,
        }
    }

    fn get_browser(&self) -> Result<&Browser, ScraperError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("Browser not initialized".into()))
    }

    fn unique_user_data_dir() -> PathBuf {
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        std::env::temp_dir().join(format!("complaint-scraper-{}", unique_id))
    }

    /// Rejects Chromium error pages and non-HTML responses.
    async fn check_document(page: &Page, url: &str) -> Result<(), ScraperError> {
        let info: DocumentInfo = page
            .evaluate("({ href: window.location.href, contentType: document.contentType })")
            .await
            .map_err(|e| ScraperError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| ScraperError::Evaluation(e.to_string()))?;

        classify_document(&info, url)
    }
}

fn classify_document(info: &DocumentInfo, url: &str) -> Result<(), ScraperError> {
    if info.href.starts_with("chrome-error://") {
        return Err(ScraperError::Navigation(format!("{} could not be loaded", url)));
    }
    if !is_html(&info.content_type) {
        return Err(ScraperError::NotHtml(info.content_type.clone()));
    }
    Ok(())
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/html") || content_type.starts_with("application/xhtml+xml")
}

/// Builds the extraction expression. Selectors are embedded as JSON string literals.
fn extract_script(selectors: &Selectors) -> String {
    let quote = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());

    format!(
        r#"
        (function() {{
            var text = function(selector) {{
                var el = document.querySelector(selector);
                return el ? el.textContent : null;
            }};
            return {{
                title: text({title}),
                body: text({body}),
                date: text({date})
            }};
        }})()
        "#,
        title = quote(&selectors.title),
        body = quote(&selectors.body),
        date = quote(&selectors.date),
    )
}

#[async_trait]
impl Scraper for ComplaintScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Launching browser...");

        let user_data_dir = Self::unique_user_data_dir();

        let mut builder = BrowserConfig::builder().user_data_dir(&user_data_dir);

        if let Some(chrome_path) = &self.config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(CDP_REQUEST_TIMEOUT_SECS))
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        self.user_data_dir = Some(user_data_dir);

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        self.browser = Some(browser);
        self.handler = Some(handler_task);

        info!("Browser launched");
        Ok(())
    }

    async fn extract(&mut self, url: &str) -> Result<ComplaintFields, ScraperError> {
        let browser = self.get_browser()?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let idle = NetworkIdle::attach(&page, self.config.network_idle).await?;

        info!("Navigating to {}", url);
        page.goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(format!("{}: {}", url, e)))?;

        idle.wait().await?;
        Self::check_document(&page, url).await?;

        let raw: RawFields = page
            .evaluate(extract_script(&self.config.selectors))
            .await
            .map_err(|e| ScraperError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| ScraperError::Evaluation(e.to_string()))?;

        if raw.body.is_none() {
            debug!("No complaint body found on {}", url);
        }

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        Ok(raw.into())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(mut browser) = self.browser.take() {
            debug!("Closing browser...");
            if let Err(e) = browser.close().await {
                debug!("Browser close command failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Waiting for browser exit failed: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Could not remove profile dir {:?}: {}", dir, e);
            }
        }

        Ok(())
    }
}

/// Reached without `close` only when the scrape future is dropped (timeout or
/// cancellation). Dropping the `Browser` kills the Chromium child.
impl Drop for ComplaintScraper {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.browser = None;
        if let Some(dir) = self.user_data_dir.take() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
