//! Link Collector: turns an infinite-scroll listing page into a deduplicated,
//! discovery-ordered list of detail-page URLs.

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::WebDriverError;
use crate::profile::SiteProfile;
use crate::wait::{poll_until, settle};
use crate::webdriver::{By, Driver, ElementRef, Scroll};

/// Consecutive no-growth re-queries that end scroll loading.
const STALL_LIMIT: usize = 2;

pub async fn collect_links<D: Driver>(
    driver: &D,
    profile: &SiteProfile,
    listing_url: &str,
    target: usize,
) -> Vec<String> {
    if target == 0 {
        return Vec::new();
    }
    let origin = match profile.origin() {
        Ok(origin) => origin,
        Err(err) => {
            warn!(error = %err, "cannot resolve links without a site origin");
            return Vec::new();
        }
    };
    let timing = &profile.timing;
    let cards = By::class(&profile.listing.card_class);

    info!(url = listing_url, target, "loading listing page");
    if let Err(err) = driver.navigate(listing_url).await {
        warn!(url = listing_url, error = %err, "listing navigation failed");
    }
    settle(timing.page_settle()).await;

    let card_query = &cards;
    let cards_present = poll_until(timing.card_wait(), timing.poll_interval(), move || async move {
        Ok::<_, WebDriverError>(driver.count(card_query).await? > 0)
    })
    .await;
    if !cards_present {
        warn!(
            url = listing_url,
            selector = %cards,
            "listing cards not found, scanning all anchors instead"
        );
        return fallback_scan(driver, &origin, &profile.site.fallback_path_patterns, target)
            .await;
    }

    let mut links = Vec::<String>::new();
    let mut seen = HashSet::<String>::new();
    let mut last_count = 0usize;
    let mut stalls = 0usize;

    for attempt in 1..=profile.listing.max_scroll_attempts.max(1) {
        let found = match driver.find_all(&cards).await {
            Ok(found) => found,
            Err(err) => {
                warn!(selector = %cards, error = %err, "card re-query failed");
                Vec::new()
            }
        };
        debug!(attempt, cards = found.len(), links = links.len(), "listing re-query");

        for (idx, card) in found.iter().enumerate() {
            match card_link(driver, card, &origin).await {
                Ok(Some(link)) => {
                    if seen.insert(link.clone()) {
                        debug!(card = idx + 1, url = %link, "found posting link");
                        links.push(link);
                    }
                }
                Ok(None) => debug!(card = idx + 1, "card has no usable anchor"),
                Err(err) => warn!(card = idx + 1, selector = %cards, error = %err, "card link extraction failed"),
            }
        }
        if links.len() >= target {
            break;
        }

        if found.len() <= last_count {
            stalls += 1;
            if stalls >= STALL_LIMIT {
                info!(attempt, cards = found.len(), "listing stopped growing");
                break;
            }
        } else {
            stalls = 0;
            last_count = found.len();
        }

        if let Some(last) = found.last() {
            if let Err(err) = driver.scroll(Scroll::IntoView(last)).await {
                debug!(error = %err, "scroll to last card failed");
            }
        }
        if let Err(err) = driver.scroll(Scroll::Bottom).await {
            debug!(error = %err, "scroll to bottom failed");
        }
        settle(timing.scroll_settle()).await;
    }

    links.truncate(target);
    info!(found = links.len(), target, "link collection finished");
    links
}

async fn card_link<D: Driver>(
    driver: &D,
    card: &ElementRef,
    origin: &Url,
) -> Result<Option<String>, WebDriverError> {
    let Some(anchor) = driver
        .find_all_in(card, &By::css("a"))
        .await?
        .into_iter()
        .next()
    else {
        return Ok(None);
    };
    let href = driver.attribute(&anchor, "href").await?;
    Ok(href.and_then(|href| absolutize(origin, &href)))
}

async fn fallback_scan<D: Driver>(
    driver: &D,
    origin: &Url,
    patterns: &[String],
    target: usize,
) -> Vec<String> {
    match driver.page_source().await {
        Ok(html) => {
            let links = anchor_links(&html, origin, patterns, target);
            info!(found = links.len(), "anchor scan finished");
            links
        }
        Err(err) => {
            warn!(error = %err, "page source unavailable for anchor scan");
            Vec::new()
        }
    }
}

/// Every anchor in `html` whose resolved URL contains one of `patterns`,
/// deduplicated, in document order, at most `target` long.
pub fn anchor_links(html: &str, origin: &Url, patterns: &[String], target: usize) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&selector) {
        let Some(link) = el.value().attr("href").and_then(|h| absolutize(origin, h)) else {
            continue;
        };
        let matches = patterns.is_empty() || patterns.iter().any(|p| link.contains(p.as_str()));
        if matches && seen.insert(link.clone()) {
            out.push(link);
            if out.len() >= target {
                break;
            }
        }
    }
    out
}

/// Resolves a card href against the site origin; non-web schemes are dropped.
pub fn absolutize(origin: &Url, href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = origin.join(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
