mod cli;
mod config;
mod terminal;

use std::sync::Arc;

use anyhow::{bail, Result};
use bookgrab_engine::{
    adapter::{direct_svg_page_address, probe_direct_svg_page},
    AcquireOutcome, AssetFetcher, BookDownloader, HttpSurface, OutputPrompt, ReqwestFetcher,
};
use clap::Parser;
use grab_logging::{grab_info, grab_warn};
use log::LevelFilter;

use crate::cli::{Cli, Command};
use crate::config::FileConfig;
use crate::terminal::{FixedOutput, StdinPrompt, TerminalProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    grab_logging::initialize(cli.log, level, None);

    let config = FileConfig::load(cli.config.as_deref())?;
    match cli.command {
        Some(Command::Probe { ref url, page }) => probe(&config, url, page).await,
        None => download(&cli, &config).await,
    }
}

async fn probe(config: &FileConfig, url: &str, page: i64) -> Result<()> {
    let settings = config.apply(Default::default());
    let fetcher = ReqwestFetcher::new(settings.fetch);
    let Some(address) = direct_svg_page_address(url, page) else {
        bail!("{url} is not a valid book address");
    };
    if probe_direct_svg_page(&fetcher, url, page).await {
        println!("page {page} is available at {address}");
    } else {
        println!("page {page} is not available at {address}");
    }
    Ok(())
}

async fn download(cli: &Cli, config: &FileConfig) -> Result<()> {
    let Some(url) = cli.url.as_deref() else {
        bail!("no book address given");
    };
    let settings = config.apply(Default::default());
    let fetcher: Arc<dyn AssetFetcher> = Arc::new(ReqwestFetcher::new(settings.fetch.clone()));
    let surface = Arc::new(HttpSurface::open(fetcher.clone(), url).await?);
    let prompt: Arc<dyn OutputPrompt> = match &cli.output {
        Some(path) => Arc::new(FixedOutput(path.clone())),
        None => Arc::new(StdinPrompt),
    };

    let downloader = BookDownloader::new(surface, fetcher, prompt, Arc::new(TerminalProgress))
        .with_settings(settings)
        .with_output_dir(config.output_dir());

    let token = downloader.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            grab_warn!("interrupt received, stopping download");
            token.cancel();
        }
    });

    let outcome = if cli.book {
        downloader.acquire_whole_book().await?
    } else {
        downloader.acquire_current_page().await?
    };
    match outcome {
        AcquireOutcome::Completed { summary, session } => {
            grab_info!("stopped after index {} ({:?})", session.current_index, session.stop_reason);
            println!("Saved {} pages to {}", summary.pages, summary.path.display());
        }
        AcquireOutcome::Cancelled => println!("Nothing saved."),
    }
    Ok(())
}
