use tracing::info;

use crate::collector::collect_links;
use crate::extractor::extract;
use crate::profile::SiteProfile;
use crate::record::{FieldKind, PostingRecord, ResultTable, assemble};
use crate::webdriver::Driver;

#[derive(Debug, Clone)]
pub struct Harvest {
    pub links: Vec<String>,
    pub records: Vec<PostingRecord>,
    pub table: ResultTable,
}

/// Collects up to `target` posting links from `listing_url`, extracts every
/// one of them in order and assembles the result table. One row per link,
/// whatever the extractor managed to find.
pub async fn harvest<D: Driver>(
    driver: &D,
    profile: &SiteProfile,
    listing_url: &str,
    target: usize,
) -> Harvest {
    let links = collect_links(driver, profile, listing_url, target).await;
    if links.is_empty() {
        info!(
            url = listing_url,
            selector = %profile.listing.card_class,
            "no posting links found; the listing markup may have changed"
        );
    }

    let mut records = Vec::with_capacity(links.len());
    for (idx, link) in links.iter().enumerate() {
        info!(page = idx + 1, total = links.len(), url = %link, "processing posting");
        records.push(extract(driver, profile, link).await);
    }

    let table = assemble(&records, &profile.fields);
    log_summary(&records);
    Harvest {
        links,
        records,
        table,
    }
}

fn log_summary(records: &[PostingRecord]) {
    let with_company = records.iter().filter(|r| r.company_name.is_some()).count();
    let per_field = |kind: FieldKind| records.iter().filter(|r| r.field(kind).is_some()).count();
    info!(
        processed = records.len(),
        with_company,
        responsibilities = per_field(FieldKind::Responsibilities),
        requirements = per_field(FieldKind::Requirements),
        preferred = per_field(FieldKind::Preferred),
        "harvest summary"
    );
}
