//! Geometric label→value pairing.
//!
//! The detail page renders section headings and section bodies as two
//! unrelated element groups. A heading owns the nearest unconsumed body whose
//! top edge sits at or below its own top edge.

use std::collections::BTreeMap;

use tracing::debug;

use crate::profile::FieldLabels;
use crate::record::FieldKind;

// Sub-pixel layout rounding between a heading and a body on the same line.
const SAME_LINE_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub top: f64,
}

impl PlacedText {
    pub fn new(text: impl Into<String>, top: f64) -> Self {
        Self {
            text: text.into(),
            top,
        }
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn match_label(text: &str, labels: &FieldLabels) -> Option<FieldKind> {
    let heading = compact(text);
    if heading.is_empty() {
        return None;
    }
    FieldKind::ALL
        .into_iter()
        .find(|kind| heading.contains(&compact(labels.label(*kind))))
}

pub fn pair_fields(
    labels: &[PlacedText],
    values: &[PlacedText],
    field_labels: &FieldLabels,
) -> BTreeMap<FieldKind, String> {
    let mut consumed = vec![false; values.len()];
    let mut out = BTreeMap::new();

    for label in labels {
        if out.len() == FieldKind::ALL.len() {
            break;
        }
        let Some(kind) = match_label(&label.text, field_labels) else {
            continue;
        };
        if out.contains_key(&kind) {
            continue;
        }

        let nearest = values
            .iter()
            .enumerate()
            .filter(|(idx, value)| {
                !consumed[*idx]
                    && !value.text.trim().is_empty()
                    && value.top + SAME_LINE_TOLERANCE >= label.top
            })
            .min_by(|(ia, a), (ib, b)| {
                (a.top - label.top)
                    .total_cmp(&(b.top - label.top))
                    .then(ia.cmp(ib))
            });

        match nearest {
            Some((idx, value)) => {
                consumed[idx] = true;
                out.insert(kind, value.text.clone());
            }
            None => debug!(field = kind.key(), label = %label.text, "no value element below label"),
        }
    }

    out
}
