//! "Reveal more" locator strategies.
//!
//! The detail page hides most of the posting behind a button whose markup
//! changes between deployments. The profile lists strategies in preference
//! order and the extractor tries each until one yields a clickable element.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use crate::error::WebDriverError;
use crate::wait::poll_for;
use crate::webdriver::{By, Driver, ElementRef};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevealLocator {
    /// The control itself carries `class`.
    Class { class: String },
    /// An element inside the control carries `class`; the control is its
    /// nearest `tag` ancestor.
    Ancestor { class: String, tag: String },
    /// A `tag` element whose text contains `phrase`.
    Text { tag: String, phrase: String },
}

impl RevealLocator {
    pub fn strategy(&self) -> &'static str {
        match self {
            RevealLocator::Class { .. } => "class",
            RevealLocator::Ancestor { .. } => "ancestor",
            RevealLocator::Text { .. } => "text",
        }
    }

    /// The selector this strategy queries first, for log context.
    pub fn selector(&self) -> By {
        match self {
            RevealLocator::Class { class } | RevealLocator::Ancestor { class, .. } => {
                By::class(class)
            }
            RevealLocator::Text { tag, phrase } => By::xpath(&format!(
                "//{tag}[contains(normalize-space(.), {})]",
                xpath_literal(phrase)
            )),
        }
    }

    /// Polls until the strategy resolves to a displayed element or `timeout`
    /// elapses.
    pub async fn locate<D: Driver>(
        &self,
        driver: &D,
        timeout: Duration,
        interval: Duration,
    ) -> Option<ElementRef> {
        poll_for(timeout, interval, move || self.find_displayed(driver)).await
    }

    async fn find_displayed<D: Driver>(
        &self,
        driver: &D,
    ) -> Result<Option<ElementRef>, WebDriverError> {
        let by = self.selector();
        match self {
            RevealLocator::Class { .. } | RevealLocator::Text { .. } => {
                first_displayed(driver, driver.find_all(&by).await?).await
            }
            RevealLocator::Ancestor { tag, .. } => {
                let Some(inner) = driver.find_first(&by).await? else {
                    return Ok(None);
                };
                let ancestors = driver
                    .find_all_in(&inner, &By::xpath(&format!("./ancestor::{tag}")))
                    .await?;
                // Ancestor axis results come back in document order.
                match ancestors.last() {
                    Some(control) if driver.is_displayed(control).await? => {
                        Ok(Some(control.clone()))
                    }
                    _ => Ok(None),
                }
            }
        }
    }
}

impl fmt::Display for RevealLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealLocator::Class { class } => write!(f, "class .{class}"),
            RevealLocator::Ancestor { class, tag } => write!(f, "{tag} around .{class}"),
            RevealLocator::Text { tag, phrase } => write!(f, "{tag} containing {phrase:?}"),
        }
    }
}

async fn first_displayed<D: Driver>(
    driver: &D,
    candidates: Vec<ElementRef>,
) -> Result<Option<ElementRef>, WebDriverError> {
    for candidate in candidates {
        if driver.is_displayed(&candidate).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Quotes `text` as an XPath 1.0 string literal.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts = text
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect::<Vec<_>>()
        .join(", \"'\", ");
    format!("concat({parts})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_strategies() {
        #[derive(Deserialize)]
        struct Wrapper {
            reveal: Vec<RevealLocator>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[reveal]]
            kind = "class"
            class = "more"

            [[reveal]]
            kind = "ancestor"
            class = "icon"
            tag = "button"

            [[reveal]]
            kind = "text"
            tag = "a"
            phrase = "Show more"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.reveal,
            vec![
                RevealLocator::Class {
                    class: "more".into()
                },
                RevealLocator::Ancestor {
                    class: "icon".into(),
                    tag: "button".into()
                },
                RevealLocator::Text {
                    tag: "a".into(),
                    phrase: "Show more".into()
                },
            ]
        );
    }

    #[test]
    fn text_selector_quotes_phrase() {
        let locator = RevealLocator::Text {
            tag: "button".into(),
            phrase: "상세 정보 더 보기".into(),
        };
        assert_eq!(
            locator.selector(),
            By::xpath("//button[contains(normalize-space(.), '상세 정보 더 보기')]")
        );
    }

    #[test]
    fn xpath_literal_handles_both_quote_kinds() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"it's "x""#),
            r#"concat('it', "'", 's "x"')"#
        );
    }
}
