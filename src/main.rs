use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use complaint_scraper::server::{self, AppState};
use complaint_scraper::{
    ComplaintService, FailurePolicy, HttpScrapeService, LinkList, ScrapeClient, ScraperConfig,
    ScraperService, ServerConfig, Session,
};

#[derive(Parser)]
#[command(name = "complaint-scraper", version, about = "Scrape Reclame Aqui complaints into a spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (default: $PORT or 3000)
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Scrape a list of complaint links and export them to xlsx
    Analyze {
        /// Complaint page URLs
        urls: Vec<String>,

        /// Read additional URLs from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Directory for analise-reclame-aqui.xlsx
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Scrape through a running server instead of a local browser
        #[arg(long)]
        server: Option<String>,

        #[command(flatten)]
        batch: BatchArgs,
    },
}

#[derive(Args)]
struct BatchArgs {
    /// Number of pages scraped at once
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Skip failed links instead of aborting the batch
    #[arg(long)]
    skip_failures: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

impl BatchArgs {
    fn policy(&self) -> FailurePolicy {
        if self.skip_failures {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }

    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig::from_env().with_headless(!self.headed)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,complaint_scraper=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, batch } => {
            let config = match port {
                Some(port) => ServerConfig::default().with_port(port),
                None => ServerConfig::from_env(),
            };
            let state = AppState::new(ScraperService::new(batch.scraper_config()))
                .with_workers(batch.workers)
                .with_policy(batch.policy());

            server::serve(config, state).await?;
        }
        Command::Analyze {
            urls,
            file,
            out_dir,
            server,
            batch,
        } => {
            let session = load_session(urls, file.as_deref())?;

            match server {
                Some(base) => {
                    let service = HttpScrapeService::new(&base)?;
                    info!("Scraping through {}", service.endpoint());
                    run_batch(session, service, &batch, &out_dir).await?;
                }
                None => {
                    let service = ScraperService::new(batch.scraper_config());
                    run_batch(session, service, &batch, &out_dir).await?;
                }
            }
        }
    }

    Ok(())
}

fn load_session(mut urls: Vec<String>, file: Option<&Path>) -> Result<Session> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading link file {}", path.display()))?;
        urls.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    let (links, dropped) = LinkList::from_links(urls);
    if dropped > 0 {
        warn!("{} link(s) over the limit of {} were dropped", dropped, complaint_scraper::MAX_LINKS);
    }
    Ok(Session::with_links(links))
}

async fn run_batch<S: ComplaintService>(
    mut session: Session,
    service: S,
    batch: &BatchArgs,
    out_dir: &Path,
) -> Result<()> {
    if !session.can_submit() {
        bail!("no complaint links given");
    }

    let client = ScrapeClient::new(service)
        .with_workers(batch.workers)
        .with_policy(batch.policy());

    session.analyze(&client).await?;

    for result in session.results() {
        println!("URL: {}", result.url);
        println!("  {}", result.title);
        println!("  {}", result.complaint_text);
        println!("  Data: {}", result.date);
    }
    for failure in session.failures() {
        println!("FAILED: {} ({})", failure.url, failure.error);
    }

    if session.can_export() {
        let path = session.export(out_dir)?;
        println!("Saved {}", path.display());
    } else {
        warn!("No complaints scraped; nothing exported");
    }

    Ok(())
}
