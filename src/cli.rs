use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "posting-harvest",
    version,
    about = "Collects job postings from a listing page and exports them to a spreadsheet"
)]
pub struct Cli {
    /// Listing page to start from; prompted for when omitted.
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Number of postings to collect.
    #[arg(short = 'n', long, value_name = "N", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Spreadsheet path; defaults to `<prefix>_<timestamp>.xlsx`.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Site profile replacing the built-in one.
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    #[arg(long, value_name = "URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    #[arg(long, value_name = "PATH")]
    pub webdriver_binary: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_webdriver_autostart: bool,

    #[arg(long, value_name = "MS", default_value_t = 12000)]
    pub webdriver_start_timeout_ms: u64,

    #[arg(long, default_value_t = false)]
    pub headless: bool,

    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Save without asking for confirmation.
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Close the browser without waiting for Enter.
    #[arg(long, default_value_t = false)]
    pub no_pause: bool,

    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
