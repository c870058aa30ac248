//! Browser Session Manager.
//!
//! A [`BrowserSession`] owns the chromedriver process (when we started it),
//! the WebDriver session and Chrome's throwaway profile directory for the
//! whole run. `close` releases all of them; if the session is dropped without
//! `close` (early return, panic) the driver process is still killed by
//! `ManagedDriver`'s `Drop` and the profile directory by `TempDir`'s.

use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::webdriver::WebDriverClient;
use crate::webdriver::capabilities::chrome_capabilities;
use crate::webdriver::launcher::{LaunchOptions, ManagedDriver, ensure_webdriver_ready};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub webdriver_url: String,
    pub webdriver_binary: Option<String>,
    pub autostart: bool,
    pub start_timeout: Duration,
    pub headless: bool,
    pub user_agent: String,
}

pub struct BrowserSession {
    client: WebDriverClient,
    driver: ManagedDriver,
    profile_dir: TempDir,
}

impl BrowserSession {
    pub async fn open(opts: &SessionOptions) -> Result<Self, SessionError> {
        let driver = ensure_webdriver_ready(&LaunchOptions {
            endpoint: opts.webdriver_url.clone(),
            driver_binary: opts.webdriver_binary.clone(),
            autostart: opts.autostart,
            start_timeout: opts.start_timeout,
        })
        .await?;

        let profile_dir = tempfile::Builder::new()
            .prefix("posting-harvest-chrome-profile-")
            .tempdir()
            .map_err(|err| SessionError::Launch(format!("failed to create Chrome profile dir: {err}")))?;
        let caps = chrome_capabilities(opts.headless, &opts.user_agent, profile_dir.path());
        let client = WebDriverClient::create_session(&driver.endpoint, &caps).await?;
        info!(
            endpoint = %driver.endpoint,
            session_id = client.session_id(),
            managed = driver.is_managed(),
            "browser session ready"
        );
        Ok(Self {
            client,
            driver,
            profile_dir,
        })
    }

    /// Chrome's `--user-data-dir` for this session.
    pub fn profile_dir(&self) -> &Path {
        self.profile_dir.path()
    }

    pub async fn close(self) {
        let Self {
            client,
            mut driver,
            profile_dir,
        } = self;
        if let Err(err) = client.delete_session().await {
            warn!(error = %err, "webdriver session delete failed");
        }
        driver.stop();
        let dir = profile_dir.path().to_path_buf();
        if let Err(err) = profile_dir.close() {
            warn!(path = %dir.display(), error = %err, "chrome profile cleanup failed");
        }
        info!("browser session closed");
    }
}

impl Deref for BrowserSession {
    type Target = WebDriverClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
