use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("webdriver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webdriver HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{error}: {message}")]
    Protocol { error: String, message: String },

    #[error("webdriver response decode failed: {0}")]
    Decode(String),
}

impl WebDriverError {
    /// W3C error code, when the remote end reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            WebDriverError::Protocol { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }
}

/// Browser session setup failures. These abort the run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch webdriver: {0}")]
    Launch(String),

    #[error("webdriver endpoint {0} unreachable and autostart is disabled")]
    Unreachable(String),

    #[error("session create failed: {0}")]
    WebDriver(#[from] WebDriverError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("spreadsheet archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("delimited output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("result table has no rows")]
    EmptyTable,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("profile field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("profile field '{field}' is out of range: {reason}")]
    OutOfRange { field: String, reason: String },
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("console I/O failed: {0}")]
    Console(#[from] io::Error),
}
