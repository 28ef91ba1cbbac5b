//! Chart-spec data contract.
//!
//! The pipeline's terminal artifact: ordered labels, counts/percentages,
//! grouping, and axis ordering, serialized as JSON for whatever renderer
//! sits downstream. No drawing happens in this crate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::Bucket;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Series {
    /// Group label (`hue`), absent for ungrouped charts.
    pub name: Option<String>,
    pub counts: Vec<u64>,
    pub percentages: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// Grouped bar distribution: one series per group, aligned on `x_labels`.
    Grouped {
        x_labels: Vec<String>,
        series: Vec<Series>,
        category_orders: BTreeMap<String, Vec<String>>,
    },
    /// Flat categorical distribution.
    Categorical {
        labels: Vec<String>,
        counts: Vec<u64>,
        percentages: Vec<f64>,
    },
    /// Raw numeric series for histogram rendering.
    Histogram { values: Vec<f64>, x_label: String },
    /// Per-subcolumn mean and standard deviation.
    Average {
        labels: Vec<String>,
        means: Vec<f64>,
        std_devs: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSpec {
    pub question_id: String,
    pub title: String,
    pub y_title: String,
    pub x_title: String,
    pub swap_axes: bool,
    pub data: ChartData,
}

/// Pivot aggregated `(group, bucket)` rows into aligned per-group series.
/// Bucket keys are `[group, x_label]`; combinations absent from the input
/// appear as zero count / zero percent so every series has the same length.
pub fn grouped_from_buckets(
    buckets: &[Bucket],
    x_order: Vec<String>,
    group_order: Vec<String>,
) -> ChartData {
    let mut series = Vec::with_capacity(group_order.len());
    for group in &group_order {
        let mut counts = Vec::with_capacity(x_order.len());
        let mut percentages = Vec::with_capacity(x_order.len());
        for x in &x_order {
            let found = buckets
                .iter()
                .find(|b| b.keys.len() == 2 && &b.keys[0] == group && &b.keys[1] == x);
            counts.push(found.map_or(0, |b| b.count));
            percentages.push(found.map_or(0.0, |b| b.percentage));
        }
        series.push(Series {
            name: Some(group.clone()),
            counts,
            percentages,
        });
    }

    let mut category_orders = BTreeMap::new();
    category_orders.insert("value".to_string(), x_order.clone());
    category_orders.insert("group".to_string(), group_order);

    ChartData::Grouped {
        x_labels: x_order,
        series,
        category_orders,
    }
}

/// Shorten a question title the way chart headers want it: cut after the
/// first question mark or period.
pub fn truncate_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<MISSING QUESTION TITLE>".to_string();
    }
    if let Some((head, _)) = trimmed.split_once('?') {
        return format!("{}?", head.trim());
    }
    if let Some((head, _)) = trimmed.split_once('.') {
        return format!("{}.", head.trim());
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_fills_missing_combinations_with_zero() {
        let buckets = vec![
            Bucket {
                keys: vec!["Woman".into(), "0–1".into()],
                count: 2,
                percentage: 50.0,
            },
            Bucket {
                keys: vec!["Man".into(), "2–3".into()],
                count: 2,
                percentage: 50.0,
            },
        ];
        let data = grouped_from_buckets(
            &buckets,
            vec!["0–1".into(), "2–3".into()],
            vec!["Woman".into(), "Man".into()],
        );
        let ChartData::Grouped { series, .. } = data else {
            panic!("expected grouped data");
        };
        assert_eq!(series[0].counts, vec![2, 0]);
        assert_eq!(series[1].counts, vec![0, 2]);
        assert_eq!(series[1].percentages, vec![0.0, 50.0]);
    }

    #[test]
    fn titles_truncate_after_first_sentence_break() {
        assert_eq!(
            truncate_title("How long is the leave? Please answer in weeks."),
            "How long is the leave?"
        );
        assert_eq!(
            truncate_title("Leave policy. Details follow."),
            "Leave policy."
        );
        assert_eq!(truncate_title(""), "<MISSING QUESTION TITLE>");
    }
}
