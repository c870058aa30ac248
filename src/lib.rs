//! Browser-driven job posting harvester.
//!
//! Collects posting links from a recruiting site's listing page, extracts a
//! fixed set of sections from every posting through a WebDriver session and
//! exports the result as a spreadsheet.

pub mod app;
pub mod cli;
pub mod collector;
pub mod error;
pub mod export;
pub mod extractor;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod session;
pub mod wait;
pub mod webdriver;
