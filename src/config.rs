use std::path::PathBuf;
use std::time::Duration;

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 3000;

/// CSS selectors for the three complaint fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub title: String,
    pub body: String,
    pub date: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            title: ".complaint-title".to_string(),
            body: ".complaint-body".to_string(),
            date: ".complaint-date".to_string(),
        }
    }
}

/// Network idle condition: at most `max_in_flight` outstanding requests for `quiet_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIdleConfig {
    pub max_in_flight: usize,
    pub quiet_window: Duration,
}

impl Default for NetworkIdleConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 0,
            quiet_window: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub headless: bool,
    /// Per-URL budget covering launch, navigation, idle wait and extraction.
    pub timeout: Duration,
    pub chrome_path: Option<PathBuf>,
    pub selectors: Selectors,
    pub network_idle: NetworkIdleConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: Duration::from_secs(30),
            chrome_path: None,
            selectors: Selectors::default(),
            network_idle: NetworkIdleConfig::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up the Chromium executable from `CHROME_PATH` or `CHROMIUM_PATH`.
    pub fn from_env() -> Self {
        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            chrome_path,
            ..Default::default()
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_network_idle(mut self, network_idle: NetworkIdleConfig) -> Self {
        self.network_idle = network_idle;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl ServerConfig {
    /// Reads `PORT`; falls back to 3000 when unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_port_var(std::env::var("PORT").ok().as_deref())
    }

    fn from_port_var(value: Option<&str>) -> Self {
        let port = value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { port }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
