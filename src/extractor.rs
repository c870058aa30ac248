//! Detail Extractor: one posting page in, one [`PostingRecord`] out.
//!
//! Nothing here returns an error. Every failed step is logged with the page
//! URL and the selector involved, and the affected field is left absent.

use tracing::{debug, info, warn};

use crate::error::WebDriverError;
use crate::layout::{PlacedText, pair_fields};
use crate::normalize::normalize;
use crate::profile::SiteProfile;
use crate::record::{FieldKind, PostingRecord};
use crate::wait::{poll_until, settle};
use crate::webdriver::{By, Driver, Scroll};

pub async fn extract<D: Driver>(driver: &D, profile: &SiteProfile, url: &str) -> PostingRecord {
    let mut record = PostingRecord::empty(url);
    let timing = &profile.timing;

    info!(url, "visiting posting");
    if let Err(err) = driver.navigate(url).await {
        warn!(url, error = %err, "detail navigation failed");
        return record;
    }
    settle(timing.page_settle()).await;
    for to in [Scroll::PageFraction(0.5), Scroll::Bottom] {
        if let Err(err) = driver.scroll(to).await {
            debug!(url, error = %err, "lazy-load scroll failed");
        }
        settle(timing.scroll_settle()).await;
    }

    let label_by = By::class(&profile.detail.label_class);
    let value_by = By::class(&profile.detail.value_class);

    if reveal(driver, profile, url, &label_by, &value_by).await {
        for to in [Scroll::Bottom, Scroll::PageFraction(0.5)] {
            if let Err(err) = driver.scroll(to).await {
                debug!(url, error = %err, "post-reveal scroll failed");
            }
            settle(timing.post_reveal_settle()).await;
        }
    }

    record.company_name = company_name(driver, &profile.detail.company_attribute, url).await;

    let mut labels = placed_texts(driver, &label_by, url).await;
    let mut values = placed_texts(driver, &value_by, url).await;
    if labels.is_empty() && values.is_empty() {
        info!(url, "no field elements by class, retrying with partial class match");
        labels = placed_texts(driver, &By::class_fragment(&profile.detail.label_class), url).await;
        values = placed_texts(driver, &By::class_fragment(&profile.detail.value_class), url).await;
    }
    debug!(url, labels = labels.len(), values = values.len(), "field candidates");

    let paired = pair_fields(&labels, &values, &profile.fields);
    for kind in FieldKind::ALL {
        let label = profile.fields.label(kind);
        match paired.get(&kind) {
            Some(raw) => {
                let text = normalize(raw);
                if text.is_empty() {
                    warn!(url, field = kind.key(), label, "field value normalized to nothing");
                } else {
                    record.fields.insert(kind, text);
                }
            }
            None => warn!(
                url,
                field = kind.key(),
                label,
                selector = %label_by,
                "field not located"
            ),
        }
    }

    info!(
        url,
        company = record.company_name.as_deref().unwrap_or(""),
        fields = record.fields.len(),
        "posting extracted"
    );
    record
}

/// Finds and clicks the "reveal more" control, then waits for the extra
/// content. Returns whether a click happened.
async fn reveal<D: Driver>(
    driver: &D,
    profile: &SiteProfile,
    url: &str,
    label_by: &By,
    value_by: &By,
) -> bool {
    let timing = &profile.timing;

    for locator in &profile.detail.reveal {
        let Some(control) = locator
            .locate(driver, timing.reveal_wait(), timing.poll_interval())
            .await
        else {
            debug!(url, strategy = locator.strategy(), locator = %locator, "reveal locator found nothing");
            continue;
        };

        if let Err(err) = driver.scroll(Scroll::IntoView(&control)).await {
            debug!(url, error = %err, "scroll to reveal control failed");
        }
        settle(timing.reveal_focus()).await;

        let before = candidate_count(driver, label_by, value_by).await.unwrap_or(0);
        match driver.click(&control).await {
            Ok(()) => {
                info!(url, strategy = locator.strategy(), "reveal control clicked");
                wait_for_content(driver, profile, label_by, value_by, before).await;
                return true;
            }
            Err(err) => warn!(
                url,
                strategy = locator.strategy(),
                selector = %locator.selector(),
                error = %err,
                "reveal click failed"
            ),
        }
    }

    warn!(url, "reveal control not found, extracting visible content only");
    false
}

/// Growth in candidate count, then visibility, then a fixed delay.
async fn wait_for_content<D: Driver>(
    driver: &D,
    profile: &SiteProfile,
    label_by: &By,
    value_by: &By,
    before: usize,
) {
    let timing = &profile.timing;

    let grew = poll_until(timing.growth_wait(), timing.poll_interval(), move || async move {
        Ok::<_, WebDriverError>(candidate_count(driver, label_by, value_by).await? > before)
    })
    .await;
    if grew {
        debug!(before, "revealed content appeared");
        return;
    }

    let visible = poll_until(timing.visibility_wait(), timing.poll_interval(), move || async move {
        for by in [label_by, value_by] {
            for element in driver.find_all(by).await? {
                if driver.is_displayed(&element).await? {
                    return Ok::<_, WebDriverError>(true);
                }
            }
        }
        Ok(false)
    })
    .await;
    if visible {
        debug!("revealed content became visible");
        return;
    }

    debug!("falling back to a fixed delay for revealed content");
    settle(timing.fallback_delay()).await;
}

async fn candidate_count<D: Driver>(
    driver: &D,
    label_by: &By,
    value_by: &By,
) -> Result<usize, WebDriverError> {
    Ok(driver.count(label_by).await? + driver.count(value_by).await?)
}

async fn company_name<D: Driver>(driver: &D, attribute: &str, url: &str) -> Option<String> {
    let by = By::css(&format!("[{attribute}]"));
    let element = match driver.find_first(&by).await {
        Ok(Some(element)) => element,
        Ok(None) => {
            warn!(url, selector = %by, "company name element not found");
            return None;
        }
        Err(err) => {
            warn!(url, selector = %by, error = %err, "company name lookup failed");
            return None;
        }
    };
    match driver.attribute(&element, attribute).await {
        Ok(Some(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => {
            warn!(url, selector = %by, "company name attribute is empty");
            None
        }
        Err(err) => {
            warn!(url, selector = %by, error = %err, "company name attribute read failed");
            None
        }
    }
}

async fn placed_texts<D: Driver>(driver: &D, by: &By, url: &str) -> Vec<PlacedText> {
    let elements = match driver.find_all(by).await {
        Ok(elements) => elements,
        Err(err) => {
            warn!(url, selector = %by, error = %err, "field element lookup failed");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(elements.len());
    for (idx, element) in elements.iter().enumerate() {
        let text = match driver.text(element).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                debug!(url, selector = %by, index = idx, error = %err, "element text unavailable");
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }
        match driver.rect(element).await {
            Ok(rect) => out.push(PlacedText::new(text, rect.y)),
            Err(err) => {
                debug!(url, selector = %by, index = idx, error = %err, "element position unavailable")
            }
        }
    }
    out
}
