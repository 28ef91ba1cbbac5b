//! Per-question analysis driver.
//!
//! Extract → tidy → bin → aggregate → chart spec, one question at a time,
//! sequentially. The gender anchor question is always processed first so the
//! cache is warm before dependent questions read it. A question that fails
//! must not take the batch down: `run_all` logs and moves on. A question
//! with nothing to say yields the `NoData` sentinel, not an error.

use anyhow::Result;
use itertools::Itertools;
use log::{info, warn};

use crate::{
    aggregate::{self, Denominator},
    binning,
    chart::{self, ChartData, ChartSpec},
    extract,
    frame::SurveyFrame,
    gender::{ANCHOR_QUESTION, GenderCache},
    metadata::{Anchor, MetadataStore, PlotType, QuestionMeta},
    schema::parse_column,
    tidy::{self, TidyRecord},
};

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionOutcome {
    Chart(ChartSpec),
    /// Zero decodable responses; the caller skips chart emission and
    /// continues. Expected and silent.
    NoData,
}

pub fn run_question(
    frame: &SurveyFrame,
    store: &MetadataStore,
    cache: &mut GenderCache,
    question_id: &str,
    reference_year: i64,
) -> Result<QuestionOutcome> {
    let meta = store.get(question_id);
    let extraction = extract::extract(question_id, frame);
    if extraction.subcolumns.is_empty() {
        return Ok(QuestionOutcome::NoData);
    }

    let grouped = meta.anchor != Anchor::None || !meta.row_map.is_empty();
    let data = if grouped {
        let records = tidy::build_tidy(
            frame,
            question_id,
            &meta,
            &extraction,
            store,
            cache,
            reference_year,
        );
        if records.is_empty() {
            return Ok(QuestionOutcome::NoData);
        }
        if meta.birth_matrix {
            birth_matrix_chart(&records)
        } else if meta.anchor == Anchor::ParentGender && question_id == ANCHOR_QUESTION {
            anchor_distribution_chart(&meta, &records)
        } else {
            grouped_distribution_chart(&meta, &records)
        }
    } else {
        match meta.plot_type {
            PlotType::Categorical => categorical_chart(question_id, &meta, &extraction),
            PlotType::Continuous => continuous_chart(&meta, &extraction),
            PlotType::Average => average_chart(question_id, &meta, &extraction),
        }
    };

    let Some(data) = data else {
        return Ok(QuestionOutcome::NoData);
    };

    let x_title = match (&meta.binning, &meta.x_label) {
        (Some(spec), _) => spec.unit_label.clone(),
        (None, Some(label)) => label.clone(),
        (None, None) => String::new(),
    };
    Ok(QuestionOutcome::Chart(ChartSpec {
        question_id: question_id.to_string(),
        title: chart::truncate_title(&frame.question_text(question_id)),
        y_title: "Percentage (%)".to_string(),
        x_title,
        swap_axes: meta.swap_axes,
        data,
    }))
}

/// Process every configured question plus any question ids found in the
/// frame, the anchor question first. Failures are per-question.
pub fn run_all(
    frame: &SurveyFrame,
    store: &MetadataStore,
    cache: &mut GenderCache,
    reference_year: i64,
) -> Vec<(String, QuestionOutcome)> {
    let mut ids = store.question_ids();
    if let Some(pos) = ids.iter().position(|id| id == ANCHOR_QUESTION) {
        let anchor = ids.remove(pos);
        ids.insert(0, anchor);
    }

    let mut outcomes = Vec::new();
    for id in ids {
        match run_question(frame, store, cache, &id, reference_year) {
            Ok(outcome) => {
                if outcome == QuestionOutcome::NoData {
                    info!("Question '{id}': no decodable responses, skipping chart");
                }
                outcomes.push((id, outcome));
            }
            Err(err) => {
                warn!("Question '{id}' failed: {err:#}");
            }
        }
    }
    outcomes
}

/// Bucket label per tidy record. Fixed edges win; otherwise numeric values
/// get adaptive equal-frequency bins computed over the whole question, and
/// non-numeric values are their own bucket.
fn bucket_labels(meta: &QuestionMeta, records: &[TidyRecord]) -> Vec<Option<String>> {
    if let Some(spec) = &meta.binning {
        return records
            .iter()
            .map(|r| r.value.as_number().and_then(|v| binning::bin_fixed(v, spec)))
            .collect();
    }

    let numeric: Vec<f64> = records.iter().filter_map(|r| r.value.as_number()).collect();
    if numeric.len() == records.len() && !numeric.is_empty() {
        return binning::bin_adaptive(&numeric, binning::DEFAULT_ADAPTIVE_BINS)
            .into_iter()
            .map(Some)
            .collect();
    }
    records.iter().map(|r| Some(r.value.to_string())).collect()
}

fn grouped_distribution_chart(meta: &QuestionMeta, records: &[TidyRecord]) -> Option<ChartData> {
    let labels = bucket_labels(meta, records);
    let entries: Vec<(Vec<String>, u64)> = records
        .iter()
        .zip(labels)
        .filter_map(|(record, bucket)| {
            let group = record.group.clone()?;
            let bucket = bucket?;
            Some((vec![group, bucket], record.count))
        })
        .collect();
    if entries.is_empty() {
        return None;
    }

    let denominator = if meta.anchor == Anchor::ParentGender {
        Denominator::Global
    } else {
        Denominator::WithinPartition
    };
    let buckets = aggregate::aggregate(&entries, denominator);

    let x_order = x_axis_order(meta, &buckets);
    let group_order = group_axis_order(meta, &buckets);
    Some(chart::grouped_from_buckets(&buckets, x_order, group_order))
}

/// The anchor question reports one 100%-summing gender distribution over the
/// full value map, zero-count labels included.
fn anchor_distribution_chart(meta: &QuestionMeta, records: &[TidyRecord]) -> Option<ChartData> {
    let entries: Vec<(Vec<String>, u64)> = records
        .iter()
        .map(|r| (vec![r.value.to_string()], r.count))
        .collect();
    let buckets = aggregate::aggregate(&entries, Denominator::Global);

    let labels = meta.value_map.labels();
    let counts: Vec<u64> = labels
        .iter()
        .map(|label| {
            buckets
                .iter()
                .find(|b| &b.keys[0] == label)
                .map_or(0, |b| b.count)
        })
        .collect();
    let percentages: Vec<f64> = labels
        .iter()
        .map(|label| {
            buckets
                .iter()
                .find(|b| &b.keys[0] == label)
                .map_or(0.0, |b| b.percentage)
        })
        .collect();
    Some(ChartData::Categorical {
        labels,
        counts,
        percentages,
    })
}

/// Birth matrix: decade buckets on the x axis, region as the hue, and the
/// percentage reported as the share of each decade across regions.
fn birth_matrix_chart(records: &[TidyRecord]) -> Option<ChartData> {
    let entries: Vec<(Vec<String>, u64)> = records
        .iter()
        .filter_map(|record| {
            let bucket = tidy::decade_bucket(record)?;
            let region = record.group.clone()?;
            Some((vec![bucket, region], record.count))
        })
        .collect();
    if entries.is_empty() {
        return None;
    }
    let mut buckets = aggregate::aggregate(&entries, Denominator::WithinPartition);
    // Pivot expects [group, x]; percentages were computed within each decade.
    for bucket in &mut buckets {
        bucket.keys.swap(0, 1);
    }

    let x_order = binning::numeric_sort(
        &buckets
            .iter()
            .map(|b| b.keys[1].clone())
            .unique()
            .collect::<Vec<_>>(),
    );
    let group_order: Vec<String> = buckets
        .iter()
        .map(|b| b.keys[0].clone())
        .unique()
        .sorted()
        .collect();
    Some(chart::grouped_from_buckets(&buckets, x_order, group_order))
}

fn categorical_chart(
    question_id: &str,
    meta: &QuestionMeta,
    extraction: &extract::Extraction,
) -> Option<ChartData> {
    let raw_values: Vec<(usize, String)> = if meta.multi_select {
        extract::flatten_multi_select(extraction, question_id)
    } else {
        let first = extraction.subcolumns.first()?;
        extraction.column_values(first)
    };
    if raw_values.is_empty() {
        return None;
    }

    let entries: Vec<(Vec<String>, u64)> = raw_values
        .iter()
        .map(|(_, raw)| {
            let label = match crate::gender::parse_code(raw) {
                Some(code) if !meta.value_map.is_empty() => meta.value_map.label_or_code(code),
                _ => raw.clone(),
            };
            (vec![label], 1)
        })
        .collect();
    let buckets = aggregate::aggregate(&entries, Denominator::Global);

    // Display order is descending frequency, label as tiebreak.
    let ordered: Vec<&aggregate::Bucket> = buckets
        .iter()
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keys.cmp(&b.keys)))
        .collect();
    Some(ChartData::Categorical {
        labels: ordered.iter().map(|b| b.keys[0].clone()).collect(),
        counts: ordered.iter().map(|b| b.count).collect(),
        percentages: ordered.iter().map(|b| b.percentage).collect(),
    })
}

fn continuous_chart(meta: &QuestionMeta, extraction: &extract::Extraction) -> Option<ChartData> {
    let mut values = Vec::new();
    for subcolumn in &extraction.subcolumns {
        values.extend(
            extraction
                .numeric_column_values(subcolumn)
                .into_iter()
                .map(|(_, v)| v),
        );
    }
    if values.is_empty() {
        return None;
    }
    Some(ChartData::Histogram {
        values,
        x_label: meta.x_label.clone().unwrap_or_else(|| "Value".to_string()),
    })
}

fn average_chart(
    question_id: &str,
    meta: &QuestionMeta,
    extraction: &extract::Extraction,
) -> Option<ChartData> {
    let format = meta.column_format();
    let mut labels = Vec::new();
    let mut means = Vec::new();
    let mut std_devs = Vec::new();
    for subcolumn in &extraction.subcolumns {
        let values: Vec<f64> = extraction
            .numeric_column_values(subcolumn)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        if values.is_empty() {
            continue;
        }
        let parsed = parse_column(subcolumn, question_id, format, &meta.row_map, &meta.sub_map);
        labels.push(parsed.display_label(subcolumn));
        means.push(mean(&values));
        std_devs.push(std_dev(&values));
    }
    if labels.is_empty() {
        return None;
    }
    Some(ChartData::Average {
        labels,
        means,
        std_devs,
    })
}

fn x_axis_order(meta: &QuestionMeta, buckets: &[aggregate::Bucket]) -> Vec<String> {
    if let Some(spec) = &meta.binning {
        // Fixed bins carry their own order; keep only non-empty ones.
        return spec
            .labels
            .iter()
            .filter(|label| buckets.iter().any(|b| &b.keys[1] == *label))
            .cloned()
            .collect();
    }
    let observed: Vec<String> = buckets.iter().map(|b| b.keys[1].clone()).unique().collect();
    if !meta.value_map.is_empty() {
        let configured: Vec<String> = meta
            .value_map
            .labels()
            .into_iter()
            .filter(|label| observed.contains(label))
            .collect();
        if !configured.is_empty() {
            return configured;
        }
    }
    binning::numeric_sort(&observed)
}

fn group_axis_order(meta: &QuestionMeta, buckets: &[aggregate::Bucket]) -> Vec<String> {
    let observed: Vec<String> = buckets.iter().map(|b| b.keys[0].clone()).unique().collect();
    if meta.anchor == Anchor::ParentGender {
        let canonical = ["Woman", "Man", "Non-binary person"];
        let mut order: Vec<String> = canonical
            .iter()
            .map(|s| s.to_string())
            .filter(|g| observed.contains(g))
            .collect();
        let extra: Vec<String> = observed
            .into_iter()
            .filter(|g| !order.contains(g))
            .collect();
        order.extend(extra);
        return order;
    }
    if !meta.row_map.is_empty() {
        let configured: Vec<String> = meta
            .row_map
            .labels()
            .into_iter()
            .filter(|label| observed.contains(label))
            .collect();
        if !configured.is_empty() {
            return configured;
        }
    }
    observed.into_iter().sorted().collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator), 0 for a single value.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() as f64 - 1.0);
    variance.max(0.0).sqrt()
}
