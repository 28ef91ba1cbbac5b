//! Tidy builder: fan a question's wide columns out into long-format records.
//!
//! One [`TidyRecord`] per decoded answer: which respondent, which group, and
//! the decoded value. The group label follows the question's anchor — the
//! parsed row label, the resolved gender of the referenced parent, or the
//! literal value itself when no other grouping axis exists. Unit-tagged
//! durations are normalized to months before anything else sees them.

use std::fmt;

use log::{debug, warn};

use crate::{
    binning,
    continent,
    extract::Extraction,
    frame::SurveyFrame,
    gender::{self, ANCHOR_QUESTION, GenderCache},
    metadata::{Anchor, MetadataStore, QuestionMeta},
    schema::parse_column,
    units::{self, CommonUnit},
};

/// Reference year for converting reported birth offsets into ages.
pub const DEFAULT_REFERENCE_YEAR: i64 = 2025;

#[derive(Debug, Clone, PartialEq)]
pub enum TidyValue {
    Number(f64),
    Label(String),
}

impl TidyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TidyValue::Number(n) => Some(*n),
            TidyValue::Label(_) => None,
        }
    }
}

impl fmt::Display for TidyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TidyValue::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            TidyValue::Number(n) => write!(f, "{n}"),
            TidyValue::Label(s) => write!(f, "{s}"),
        }
    }
}

/// One decoded observation, consumed by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRecord {
    pub respondent_id: String,
    pub group: Option<String>,
    pub value: TidyValue,
    pub count: u64,
}

pub fn build_tidy(
    frame: &SurveyFrame,
    question_id: &str,
    meta: &QuestionMeta,
    extraction: &Extraction,
    store: &MetadataStore,
    cache: &mut GenderCache,
    reference_year: i64,
) -> Vec<TidyRecord> {
    if meta.birth_matrix {
        return build_birth_matrix(frame, question_id, meta, reference_year);
    }

    let format = meta.column_format();
    let mut records = Vec::new();

    for subcolumn in &extraction.subcolumns {
        let parsed = parse_column(subcolumn, question_id, format, &meta.row_map, &meta.sub_map);

        // Trailing segment doubles as the unit code (unit-axis questions)
        // and as the parent number (parent-gender questions).
        let last_segment = subcolumn.rsplit('_').next().unwrap_or_default();

        for (row, raw) in extraction.column_values(subcolumn) {
            let Some(value) = decode_value(&raw, meta, last_segment) else {
                continue;
            };

            let (group, value) = match meta.anchor {
                Anchor::Row => (parsed.row_label.clone(), value),
                Anchor::ParentGender => {
                    let Ok(parent_number) = last_segment.parse::<i64>() else {
                        continue;
                    };
                    let label = if question_id == ANCHOR_QUESTION {
                        // The anchor question itself: decode and seed the
                        // cache in the same pass.
                        gender::resolve(frame, &meta.value_map, cache, row, parent_number)
                    } else {
                        let anchor_map = store.get(ANCHOR_QUESTION).value_map;
                        gender::resolve(frame, &anchor_map, cache, row, parent_number)
                    };
                    let Some(gender_label) = label else {
                        continue;
                    };
                    if question_id == ANCHOR_QUESTION {
                        // Gender distribution plots gender itself.
                        (Some(gender_label.clone()), TidyValue::Label(gender_label))
                    } else {
                        (Some(gender_label), value)
                    }
                }
                Anchor::None => {
                    // No grouping axis: the value groups itself.
                    (Some(value.to_string()), value)
                }
            };

            records.push(TidyRecord {
                respondent_id: frame.respondent_id(row).to_string(),
                group,
                value,
                count: 1,
            });
        }
    }

    debug!(
        "Built {} tidy record(s) for question '{question_id}'",
        records.len()
    );
    records
}

/// Decode one raw cell: normalize its unit when the sub axis is a unit,
/// decode integral answer codes through the value map, otherwise keep the
/// numeric or literal value.
fn decode_value(raw: &str, meta: &QuestionMeta, unit_segment: &str) -> Option<TidyValue> {
    if meta.sub_is_unit {
        let number = raw.trim().parse::<f64>().ok()?;
        let normalized = units::to_common_unit_lossy(
            number,
            unit_segment,
            Some(&meta.sub_map),
            CommonUnit::Months,
        );
        return Some(TidyValue::Number(normalized));
    }

    if meta.value_map.decodes_numeric_codes()
        && let Some(code) = gender::parse_code(raw)
    {
        return Some(TidyValue::Label(meta.value_map.label_or_code(code)));
    }

    match raw.trim().parse::<f64>() {
        Ok(number) => Some(TidyValue::Number(number)),
        Err(_) => Some(TidyValue::Label(raw.trim().to_string())),
    }
}

/// DE23-style matrix: per child, sub 1 holds a birth-year offset and sub 2 a
/// country code. Value is the resolved year (`reference_year − offset`),
/// group is the continent of the decoded country. Respondents without a
/// country for a child contribute nothing for that child.
fn build_birth_matrix(
    frame: &SurveyFrame,
    question_id: &str,
    meta: &QuestionMeta,
    reference_year: i64,
) -> Vec<TidyRecord> {
    let mut records = Vec::new();
    for (row_code, _) in meta.row_map.iter() {
        let year_column = format!("{question_id}_{row_code}_1");
        let country_column = format!("{question_id}_{row_code}_2");
        if frame.column_index(&year_column).is_none()
            || frame.column_index(&country_column).is_none()
        {
            continue;
        }

        for row in 0..frame.row_count() {
            let Some(raw_year) = frame.value(row, &year_column) else {
                continue;
            };
            let Some(offset) = gender::parse_code(raw_year) else {
                warn!(
                    "Question '{question_id}': column '{year_column}' has non-numeric year '{raw_year}'"
                );
                continue;
            };
            let Some(raw_country) = frame.value(row, &country_column) else {
                continue;
            };
            let Some(country_code) = gender::parse_code(raw_country) else {
                continue;
            };

            let country = meta.value_map.label_or_code(country_code);
            let region = continent::region_label(&country);
            records.push(TidyRecord {
                respondent_id: frame.respondent_id(row).to_string(),
                group: Some(region),
                value: TidyValue::Number((reference_year - offset) as f64),
                count: 1,
            });
        }
    }
    records
}

/// Decade bucket label for a birth-matrix tidy value.
pub fn decade_bucket(record: &TidyRecord) -> Option<String> {
    record.value.as_number().map(binning::decade_label)
}
