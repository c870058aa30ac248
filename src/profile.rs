//! Site profile: everything that couples the harvester to one recruiting site.
//!
//! The built-in profile is `config/wanted.toml`, compiled into the binary.
//! `--profile <FILE>` swaps in a replacement with the same shape.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ProfileError;
use crate::locator::RevealLocator;
use crate::record::FieldKind;

pub const DEFAULT_PROFILE: &str = include_str!("../config/wanted.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct SiteProfile {
    pub site: SiteSection,
    pub listing: ListingSection,
    pub detail: DetailSection,
    pub fields: FieldLabels,
    pub timing: Timing,
    pub export: ExportLayout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    pub origin: String,
    pub default_listing_url: String,
    #[serde(default)]
    pub fallback_path_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingSection {
    pub card_class: String,
    pub max_scroll_attempts: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailSection {
    pub company_attribute: String,
    pub label_class: String,
    pub value_class: String,
    #[serde(default)]
    pub reveal: Vec<RevealLocator>,
}

/// Text used both to recognise a field label on the page and as its column header.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldLabels {
    pub company_name: String,
    pub responsibilities: String,
    pub requirements: String,
    pub preferred: String,
}

impl FieldLabels {
    pub fn label(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Responsibilities => &self.responsibilities,
            FieldKind::Requirements => &self.requirements,
            FieldKind::Preferred => &self.preferred,
        }
    }
}

/// Wait and settle periods, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct Timing {
    pub page_settle_ms: u64,
    pub scroll_settle_ms: u64,
    pub card_wait_ms: u64,
    pub reveal_wait_ms: u64,
    pub reveal_focus_ms: u64,
    pub growth_wait_ms: u64,
    pub visibility_wait_ms: u64,
    pub fallback_delay_ms: u64,
    pub post_reveal_settle_ms: u64,
    pub poll_interval_ms: u64,
}

impl Timing {
    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn card_wait(&self) -> Duration {
        Duration::from_millis(self.card_wait_ms)
    }

    pub fn reveal_wait(&self) -> Duration {
        Duration::from_millis(self.reveal_wait_ms)
    }

    pub fn reveal_focus(&self) -> Duration {
        Duration::from_millis(self.reveal_focus_ms)
    }

    pub fn growth_wait(&self) -> Duration {
        Duration::from_millis(self.growth_wait_ms)
    }

    pub fn visibility_wait(&self) -> Duration {
        Duration::from_millis(self.visibility_wait_ms)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn post_reveal_settle(&self) -> Duration {
        Duration::from_millis(self.post_reveal_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportLayout {
    pub file_prefix: String,
    pub default_column_width: f64,
    pub chars_per_width_unit: f64,
    pub line_height: f64,
    pub header_row_height: f64,
    pub max_row_height: f64,
    #[serde(default)]
    pub column_widths: BTreeMap<String, f64>,
}

impl ExportLayout {
    pub fn width_for(&self, header: &str) -> f64 {
        self.column_widths
            .get(header)
            .copied()
            .unwrap_or(self.default_column_width)
    }
}

impl SiteProfile {
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::parse(DEFAULT_PROFILE)
    }

    pub fn parse(text: &str) -> Result<Self, ProfileError> {
        let profile: SiteProfile = toml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ProfileError> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn origin(&self) -> Result<Url, ProfileError> {
        Url::parse(&self.site.origin).map_err(|_| ProfileError::InvalidUrl {
            field: "site.origin".to_string(),
            url: self.site.origin.clone(),
        })
    }

    fn validate(&self) -> Result<(), ProfileError> {
        let required = [
            ("listing.card_class", &self.listing.card_class),
            ("detail.company_attribute", &self.detail.company_attribute),
            ("detail.label_class", &self.detail.label_class),
            ("detail.value_class", &self.detail.value_class),
            ("fields.company_name", &self.fields.company_name),
            ("fields.responsibilities", &self.fields.responsibilities),
            ("fields.requirements", &self.fields.requirements),
            ("fields.preferred", &self.fields.preferred),
            ("export.file_prefix", &self.export.file_prefix),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ProfileError::EmptyRequired {
                    field: field.to_string(),
                });
            }
        }

        for (field, raw) in [
            ("site.origin", &self.site.origin),
            ("site.default_listing_url", &self.site.default_listing_url),
        ] {
            let parsed = Url::parse(raw).ok();
            if !parsed.is_some_and(|u| matches!(u.scheme(), "http" | "https")) {
                return Err(ProfileError::InvalidUrl {
                    field: field.to_string(),
                    url: raw.clone(),
                });
            }
        }

        self.export.validate()
    }
}

impl ExportLayout {
    fn validate(&self) -> Result<(), ProfileError> {
        let out_of_range = |field: &str, reason: String| ProfileError::OutOfRange {
            field: format!("export.{field}"),
            reason,
        };

        let mut sizes = vec![
            ("default_column_width".to_string(), self.default_column_width),
            ("chars_per_width_unit".to_string(), self.chars_per_width_unit),
            ("line_height".to_string(), self.line_height),
            ("header_row_height".to_string(), self.header_row_height),
            ("max_row_height".to_string(), self.max_row_height),
        ];
        sizes.extend(
            self.column_widths
                .iter()
                .map(|(header, width)| (format!("column_widths.{header}"), *width)),
        );
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(out_of_range(&field, format!("{value} is not a positive number")));
            }
        }

        if self.line_height > self.max_row_height {
            return Err(out_of_range(
                "max_row_height",
                format!(
                    "{} is below line_height {}",
                    self.max_row_height, self.line_height
                ),
            ));
        }
        Ok(())
    }
}
