pub mod capabilities;
pub mod client;
pub mod launcher;

use serde::Deserialize;

use crate::error::WebDriverError;

pub use client::WebDriverClient;

/// W3C web element identifier key.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    Css(String),
    XPath(String),
}

impl By {
    pub fn class(name: &str) -> Self {
        By::Css(format!(".{}", name.trim()))
    }

    /// Matches any element whose class attribute merely contains `fragment`.
    pub fn class_fragment(fragment: &str) -> Self {
        By::Css(format!("[class*=\"{}\"]", fragment.trim()))
    }

    pub fn css(selector: &str) -> Self {
        By::Css(selector.to_string())
    }

    pub fn xpath(expr: &str) -> Self {
        By::XPath(expr.to_string())
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            By::Css(_) => "css selector",
            By::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            By::Css(v) | By::XPath(v) => v,
        }
    }
}

impl std::fmt::Display for By {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum Scroll<'a> {
    /// Fraction of the document height, 0.0 = top, 1.0 = bottom.
    PageFraction(f64),
    Bottom,
    IntoView(&'a ElementRef),
}

/// The browser operations the harvester needs. Implemented over the wire by
/// [`WebDriverClient`]; tests script an in-memory page instead.
#[allow(async_fn_in_trait)]
pub trait Driver {
    async fn navigate(&self, url: &str) -> Result<(), WebDriverError>;

    async fn find_all(&self, by: &By) -> Result<Vec<ElementRef>, WebDriverError>;

    async fn find_all_in(
        &self,
        parent: &ElementRef,
        by: &By,
    ) -> Result<Vec<ElementRef>, WebDriverError>;

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, WebDriverError>;

    async fn text(&self, element: &ElementRef) -> Result<String, WebDriverError>;

    async fn rect(&self, element: &ElementRef) -> Result<Rect, WebDriverError>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, WebDriverError>;

    async fn click(&self, element: &ElementRef) -> Result<(), WebDriverError>;

    async fn scroll(&self, to: Scroll<'_>) -> Result<(), WebDriverError>;

    async fn page_source(&self) -> Result<String, WebDriverError>;

    async fn find_first(&self, by: &By) -> Result<Option<ElementRef>, WebDriverError> {
        Ok(self.find_all(by).await?.into_iter().next())
    }

    async fn count(&self, by: &By) -> Result<usize, WebDriverError> {
        Ok(self.find_all(by).await?.len())
    }
}
