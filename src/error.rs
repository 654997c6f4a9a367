use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser init error: {0}")]
    BrowserInit(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("not an HTML document (content type: {0})")]
    NotHtml(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("batch aborted at {url}: {source}")]
    BatchAborted {
        url: String,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("nothing to analyze: first link is blank")]
    NothingToAnalyze,

    #[error("analysis already in progress")]
    AlreadyAnalyzing,

    #[error("nothing to export")]
    NothingToExport,

    #[error("export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("file error: {0}")]
    FileIO(#[from] std::io::Error),
}
