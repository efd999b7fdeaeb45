use std::path::PathBuf;

use clap::{Parser, Subcommand};
use grab_logging::LogDestination;

/// Download an e-book from a supported publishing platform into one PDF
#[derive(Parser, Debug)]
#[command(name = "bookgrab", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Address of the open book page
    pub url: Option<String>,

    /// Walk the whole book instead of saving only the current page
    #[arg(long, default_value_t = false)]
    pub book: bool,

    /// Output PDF path. Asked for interactively when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// RON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where log lines go: terminal, file or both
    #[arg(long, global = true, default_value = "terminal", value_parser = parse_destination)]
    pub log: LogDestination,

    /// Log debug details
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a page of an SVG book can be fetched directly
    Probe {
        /// Address of the book
        url: String,

        /// Page to probe
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
}

fn parse_destination(value: &str) -> Result<LogDestination, String> {
    LogDestination::parse(value).ok_or_else(|| format!("unknown log destination '{value}'"))
}
