//! Operator-facing run: prompts, session lifetime, pipeline and export.

use std::io::{self, BufRead, Write};

use chrono::Local;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::HarvestError;
use crate::export::{default_output_path, export};
use crate::pipeline::harvest;
use crate::profile::SiteProfile;
use crate::session::{BrowserSession, SessionOptions};
use crate::webdriver::capabilities::DEFAULT_USER_AGENT;

const PREVIEW_CELL_CHARS: usize = 30;

pub async fn run(cli: Cli) -> Result<(), HarvestError> {
    let profile = SiteProfile::load(cli.profile.as_deref())?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let listing_url = match cli.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            let answer = prompt_line(
                &mut input,
                &mut output,
                "Please enter the listing URL you want to access: ",
            )?;
            resolve_listing_url(&answer, &profile.site.default_listing_url)
        }
    };

    let session = BrowserSession::open(&session_options(&cli)).await?;

    let outcome = harvest_and_save(&session, &profile, &cli, &listing_url, &mut input, &mut output)
        .await;
    if let Err(err) = &outcome {
        warn!(error = %err, "run failed");
    }

    if !cli.no_pause {
        if let Err(err) = prompt_line(&mut input, &mut output, "\nPress Enter to close the browser...") {
            warn!(error = %err, "exit prompt failed");
        }
    }
    session.close().await;
    outcome
}

fn session_options(cli: &Cli) -> SessionOptions {
    SessionOptions {
        webdriver_url: cli.webdriver_url.clone(),
        webdriver_binary: cli.webdriver_binary.clone(),
        autostart: !cli.no_webdriver_autostart,
        start_timeout: std::time::Duration::from_millis(cli.webdriver_start_timeout_ms),
        headless: cli.headless,
        user_agent: cli
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    }
}

async fn harvest_and_save<R: BufRead, W: Write>(
    session: &BrowserSession,
    profile: &SiteProfile,
    cli: &Cli,
    listing_url: &str,
    input: &mut R,
    output: &mut W,
) -> Result<(), HarvestError> {
    let result = harvest(&**session, profile, listing_url, cli.count as usize).await;

    if result.table.is_empty() {
        writeln!(output, "No posting links were found.")?;
        return Ok(());
    }

    writeln!(output)?;
    for (idx, link) in result.links.iter().enumerate() {
        writeln!(output, "{}. {link}", idx + 1)?;
    }
    writeln!(output)?;
    write!(output, "{}", result.table.preview(PREVIEW_CELL_CHARS))?;

    let path = cli.output.clone().unwrap_or_else(|| {
        default_output_path(&profile.export.file_prefix, Local::now())
    });
    if !cli.yes {
        let answer = prompt_line(
            input,
            output,
            &format!("Save {} rows to {}? [Y/n] ", result.table.len(), path.display()),
        )?;
        if !confirmed(&answer) {
            info!("save skipped by operator");
            return Ok(());
        }
    }

    let written = export(&result.table, &path, &profile.export)?;
    writeln!(output, "Saved: {}", written.display())?;
    Ok(())
}

/// Prints `message` and reads one line. End of input reads as blank.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> io::Result<String> {
    write!(output, "{message}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn resolve_listing_url(answer: &str, default_url: &str) -> String {
    let answer = answer.trim();
    if answer.is_empty() {
        info!(url = default_url, "no URL given, using the default listing page");
        default_url.to_string()
    } else {
        answer.to_string()
    }
}

/// Blank means yes.
pub fn confirmed(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
