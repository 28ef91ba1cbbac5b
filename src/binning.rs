//! Binning engine.
//!
//! Converts continuous tidy values into a small, ordered set of labeled
//! buckets. Duration questions carry explicit fixed edges in metadata;
//! everything else numeric gets adaptive equal-frequency bins with an
//! equal-width fallback. Bucket labels are ordered by their first numeric
//! token, not lexicographically ("2–4" sorts before "10–12").

use std::sync::OnceLock;

use regex::Regex;

use crate::metadata::BinSpec;

/// Fixed-edge policy. The value is clipped into the configured range, then
/// matched against half-open `[lo, hi)` intervals (a `None` upper edge means
/// +∞). Values outside every interval are dropped.
pub fn bin_fixed(value: f64, spec: &BinSpec) -> Option<String> {
    let clipped = value.clamp(spec.clip_min, spec.clip_max);
    for (idx, label) in spec.labels.iter().enumerate() {
        let lo = spec.edges.get(idx).copied().flatten()?;
        let hi = spec.edges.get(idx + 1).copied().flatten();
        let inside = match hi {
            Some(hi) => clipped >= lo && clipped < hi,
            None => clipped >= lo,
        };
        if inside {
            return Some(label.clone());
        }
    }
    None
}

pub const DEFAULT_ADAPTIVE_BINS: usize = 8;

/// Adaptive policy: equal-frequency bins (duplicate boundaries merged) with a
/// fall back to 4 equal-width bins when the data has too few distinct values.
/// Returns one bucket label per input value, in input order.
pub fn bin_adaptive(values: &[f64], max_bins: usize) -> Vec<String> {
    if values.is_empty() {
        return Vec::new();
    }
    let edges = quantile_edges(values, max_bins)
        .unwrap_or_else(|| equal_width_edges(values, 4));
    values
        .iter()
        .map(|v| edge_label(*v, &edges))
        .collect()
}

fn quantile_edges(values: &[f64], max_bins: usize) -> Option<Vec<f64>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mut edges = Vec::with_capacity(max_bins + 1);
    for i in 0..=max_bins {
        let pos = (i as f64 / max_bins as f64) * (n - 1) as f64;
        let idx = pos.floor() as usize;
        let frac = pos - idx as f64;
        let edge = if idx + 1 < n {
            sorted[idx] * (1.0 - frac) + sorted[idx + 1] * frac
        } else {
            sorted[idx]
        };
        if edges.last().is_none_or(|last: &f64| edge > *last) {
            edges.push(edge);
        }
    }
    // Fewer than two intervals after merging duplicates: not enough spread.
    if edges.len() < 3 { None } else { Some(edges) }
}

fn equal_width_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };
    (0..=bins).map(|i| min + width * i as f64).collect()
}

fn edge_label(value: f64, edges: &[f64]) -> String {
    let last_bin = edges.len() - 2;
    let mut idx = last_bin;
    for i in 0..=last_bin {
        // Final interval is closed on the right.
        let inside = if i == last_bin {
            value >= edges[i]
        } else {
            value >= edges[i] && value < edges[i + 1]
        };
        if inside {
            idx = i;
            break;
        }
    }
    format!("{}–{}", format_edge(edges[idx]), format_edge(edges[idx + 1]))
}

fn format_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{edge:.0}")
    } else {
        format!("{edge:.1}")
    }
}

/// Fixed-width decade bucket, e.g. 2023 → "2020–2029".
pub fn decade_label(value: f64) -> String {
    let lo = (value / 10.0).floor() * 10.0;
    format!("{:.0}–{:.0}", lo, lo + 9.0)
}

/// Sort bucket labels by the first numeric token inside each label.
/// Labels without a numeric token go last, lexicographically.
pub fn numeric_sort(labels: &[String]) -> Vec<String> {
    fn first_number(label: &str) -> Option<f64> {
        static NUMBER: OnceLock<Regex> = OnceLock::new();
        let re = NUMBER.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid regex"));
        re.find(label).and_then(|m| m.as_str().parse().ok())
    }

    let mut sorted = labels.to_vec();
    sorted.sort_by(|a, b| {
        let ka = first_number(a);
        let kb = first_number(b);
        match (ka, kb) {
            (Some(a_num), Some(b_num)) => a_num.total_cmp(&b_num),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    sorted
}
