//! Finds the chromedriver a session talks to, starting one from PATH when the
//! configured endpoint does not answer.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::client::server_ready;
use crate::error::SessionError;

const DRIVER_NAME: &str = "chromedriver";
const READY_POLL: Duration = Duration::from_millis(200);
const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub endpoint: String,
    pub driver_binary: Option<String>,
    pub autostart: bool,
    pub start_timeout: Duration,
}

/// The endpoint a session talks to. A driver we launched comes with its
/// process and log file, both released by `stop` or on drop.
#[derive(Debug)]
pub struct ManagedDriver {
    pub endpoint: String,
    process: Option<(Child, NamedTempFile)>,
}

impl ManagedDriver {
    pub fn is_managed(&self) -> bool {
        self.process.is_some()
    }

    pub fn stop(&mut self) {
        if let Some((mut child, _log)) = self.process.take() {
            if let Err(err) = child.kill() {
                debug!(endpoint = %self.endpoint, error = %err, "chromedriver already gone");
            }
            let _ = child.wait();
            debug!(endpoint = %self.endpoint, "chromedriver stopped");
        }
    }
}

impl Drop for ManagedDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

pub async fn ensure_webdriver_ready(opts: &LaunchOptions) -> Result<ManagedDriver, SessionError> {
    let endpoint = opts.endpoint.trim_end_matches('/').to_string();
    match server_ready(&endpoint).await {
        Ok(true) => {
            info!(endpoint = %endpoint, "using running webdriver endpoint");
            return Ok(ManagedDriver {
                endpoint,
                process: None,
            });
        }
        Ok(false) => warn!(endpoint = %endpoint, "webdriver endpoint is not accepting sessions"),
        Err(err) => debug!(endpoint = %endpoint, error = %err, "webdriver endpoint not answering"),
    }
    if !opts.autostart {
        return Err(SessionError::Unreachable(endpoint));
    }

    let path_var = env::var_os("PATH");
    let binary = resolve_driver_binary(opts.driver_binary.as_deref(), path_var.as_deref())?;
    launch(&binary, opts.start_timeout).await
}

/// An explicit binary with a directory part must exist as given; a bare name
/// (or no name at all, meaning `chromedriver`) is looked up on `path_var`.
pub fn resolve_driver_binary(
    explicit: Option<&str>,
    path_var: Option<&OsStr>,
) -> Result<PathBuf, SessionError> {
    let name = explicit.unwrap_or(DRIVER_NAME);
    let given = Path::new(name);
    if given.components().count() > 1 {
        return if given.is_file() {
            Ok(given.to_path_buf())
        } else {
            Err(SessionError::Launch(format!("{name} does not exist")))
        };
    }
    find_on_path(name, path_var).ok_or_else(|| {
        SessionError::Launch(format!(
            "{name} not found on PATH; install it or pass --webdriver-binary"
        ))
    })
}

fn find_on_path(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let file_name = if name.ends_with(env::consts::EXE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{}", env::consts::EXE_SUFFIX)
    };
    env::split_paths(path_var?)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

async fn launch(binary: &Path, start_timeout: Duration) -> Result<ManagedDriver, SessionError> {
    let port = free_local_port()
        .map_err(|err| SessionError::Launch(format!("no free local port: {err}")))?;
    let endpoint = format!("http://127.0.0.1:{port}");
    let log = tempfile::Builder::new()
        .prefix("posting-harvest-chromedriver-")
        .suffix(".log")
        .tempfile()
        .map_err(|err| SessionError::Launch(format!("failed to create driver log: {err}")))?;
    let (stdout, stderr) = log
        .reopen()
        .and_then(|out| Ok((out, log.reopen()?)))
        .map_err(|err| SessionError::Launch(format!("failed to open driver log: {err}")))?;

    let mut child = Command::new(binary)
        .arg(format!("--port={port}"))
        .arg("--log-level=SEVERE")
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|err| SessionError::Launch(format!("failed to spawn {}: {err}", binary.display())))?;
    info!(binary = %binary.display(), endpoint = %endpoint, "starting chromedriver");

    let deadline = Instant::now() + start_timeout;
    loop {
        if matches!(server_ready(&endpoint).await, Ok(true)) {
            info!(endpoint = %endpoint, "chromedriver ready");
            return Ok(ManagedDriver {
                endpoint,
                process: Some((child, log)),
            });
        }

        let reason = match child.try_wait() {
            Ok(Some(status)) => Some(format!("exited with {status}")),
            _ if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                Some(format!("not ready after {}ms", start_timeout.as_millis()))
            }
            _ => None,
        };
        if let Some(reason) = reason {
            let mut message = format!("{} {reason}", binary.display());
            if let Some(tail) = log_tail(log.path(), LOG_TAIL_LINES) {
                message.push_str("; driver log: ");
                message.push_str(&tail);
            }
            return Err(SessionError::Launch(message));
        }
        sleep(READY_POLL).await;
    }
}

/// Last `lines` non-blank lines of a log, joined with ` | `.
pub fn log_tail(path: &Path, lines: usize) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let kept = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    let tail = kept[kept.len().saturating_sub(lines)..].join(" | ");
    (!tail.is_empty()).then_some(tail)
}

fn free_local_port() -> io::Result<u16> {
    Ok(TcpListener::bind(("127.0.0.1", 0))?.local_addr()?.port())
}
