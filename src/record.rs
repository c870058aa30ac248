use std::collections::BTreeMap;

use serde::Serialize;

use crate::profile::FieldLabels;

/// The closed set of posting sections the harvester recognises, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Responsibilities,
    Requirements,
    Preferred,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [
        FieldKind::Responsibilities,
        FieldKind::Requirements,
        FieldKind::Preferred,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FieldKind::Responsibilities => "responsibilities",
            FieldKind::Requirements => "requirements",
            FieldKind::Preferred => "preferred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingRecord {
    pub url: String,
    pub company_name: Option<String>,
    pub fields: BTreeMap<FieldKind, String>,
}

impl PostingRecord {
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            company_name: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, kind: FieldKind) -> Option<&str> {
        self.fields.get(&kind).map(String::as_str)
    }
}

/// Uniform output table: company name column first, then every field in
/// [`FieldKind::ALL`] order. Absent values are empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fixed-width text rendering for the console; cells are cut at `cell_chars`.
    pub fn preview(&self, cell_chars: usize) -> String {
        let cut = |s: &str| -> String {
            let flat = s.replace('\n', " ");
            if flat.chars().count() > cell_chars {
                flat.chars().take(cell_chars).collect::<String>() + "…"
            } else {
                flat
            }
        };
        let pad = |s: String| -> String {
            let width = s.chars().count();
            s + &" ".repeat((cell_chars + 1).saturating_sub(width))
        };

        let mut out = String::new();
        let header_line = self
            .headers
            .iter()
            .map(|h| pad(cut(h)))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(header_line.trim_end());
        out.push('\n');
        out.push_str(&"-".repeat(header_line.chars().count()));
        out.push('\n');
        for row in &self.rows {
            let line = row
                .iter()
                .map(|cell| pad(cut(cell)))
                .collect::<Vec<_>>()
                .join(" | ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

pub fn assemble(records: &[PostingRecord], labels: &FieldLabels) -> ResultTable {
    let mut headers = vec![labels.company_name.clone()];
    headers.extend(FieldKind::ALL.iter().map(|kind| labels.label(*kind).to_string()));

    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![record.company_name.clone().unwrap_or_default()];
            row.extend(
                FieldKind::ALL
                    .iter()
                    .map(|kind| record.field(*kind).unwrap_or_default().to_string()),
            );
            row
        })
        .collect();

    ResultTable { headers, rows }
}
