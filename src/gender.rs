//! Parent-gender cross-reference resolution.
//!
//! Several questions report one column per parent and are grouped not by the
//! parent number but by that parent's gender, which lives in the anchor
//! question's columns (`DE14_1`, `DE14_2`). The cache is an explicit object
//! threaded by reference through one analysis run: the anchor question seeds
//! it, dependent questions read it, and a cold miss falls back to reading the
//! anchor column directly (same result, no memoization).

use std::collections::HashMap;

use crate::{frame::SurveyFrame, metadata::CodeMap};

/// Question id holding the per-parent gender codes.
pub const ANCHOR_QUESTION: &str = "DE14";

/// `(respondent id, parent number) → gender label`. Single writer, many
/// readers, within one sequential pass.
#[derive(Debug, Default)]
pub struct GenderCache {
    entries: HashMap<(String, i64), String>,
}

impl GenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, respondent_id: &str, parent_number: i64) -> Option<&str> {
        self.entries
            .get(&(respondent_id.to_string(), parent_number))
            .map(String::as_str)
    }

    pub fn put(&mut self, respondent_id: &str, parent_number: i64, label: String) {
        self.entries
            .insert((respondent_id.to_string(), parent_number), label);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Gender label for one respondent's parent N. Cache hit short-circuits;
/// otherwise the anchor column is read directly, decoded through the anchor
/// value map, and written through. Absent or undecodable answers are `None`,
/// never an error.
pub fn resolve(
    frame: &SurveyFrame,
    anchor_value_map: &CodeMap,
    cache: &mut GenderCache,
    row: usize,
    parent_number: i64,
) -> Option<String> {
    let respondent_id = frame.respondent_id(row).to_string();
    if let Some(label) = cache.get(&respondent_id, parent_number) {
        return Some(label.to_string());
    }

    let column = format!("{ANCHOR_QUESTION}_{parent_number}");
    let raw = frame.value(row, &column)?;
    let code = parse_code(raw)?;
    let label = anchor_value_map.get(code)?.to_string();
    cache.put(&respondent_id, parent_number, label.clone());
    Some(label)
}

/// Answer codes may be exported as "1" or "1.0".
pub(crate) fn parse_code(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Some(code);
    }
    let as_float = trimmed.parse::<f64>().ok()?;
    if as_float.fract() == 0.0 {
        Some(as_float as i64)
    } else {
        None
    }
}
