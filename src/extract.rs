//! Response extraction.
//!
//! Finds the run of columns belonging to a question and pulls the raw
//! per-respondent values. Columns for one question are contiguous in the
//! export, so scanning stops at the first non-matching column after a match;
//! any loader feeding this crate must preserve that invariant.

use log::debug;

use crate::frame::SurveyFrame;

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Data columns, lexicographically sorted.
    pub subcolumns: Vec<String>,
    /// Free-text companion columns (`_TEXT` suffix), lexicographically sorted.
    pub text_columns: Vec<String>,
    /// One entry per respondent row that answered at least one subcolumn:
    /// `(row index, per-subcolumn raw values)` aligned with `subcolumns`.
    pub responses: Vec<(usize, Vec<Option<String>>)>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Raw values of one subcolumn as `(row, value)` pairs, blanks dropped.
    pub fn column_values(&self, subcolumn: &str) -> Vec<(usize, String)> {
        let Some(idx) = self.subcolumns.iter().position(|c| c == subcolumn) else {
            return Vec::new();
        };
        self.responses
            .iter()
            .filter_map(|(row, values)| {
                values[idx].as_ref().map(|v| (*row, v.clone()))
            })
            .collect()
    }

    /// Numeric view of one subcolumn; non-numeric cells are discarded, not
    /// errors.
    pub fn numeric_column_values(&self, subcolumn: &str) -> Vec<(usize, f64)> {
        self.column_values(subcolumn)
            .into_iter()
            .filter_map(|(row, raw)| raw.trim().parse::<f64>().ok().map(|v| (row, v)))
            .collect()
    }
}

pub fn extract(question_id: &str, frame: &SurveyFrame) -> Extraction {
    let prefix = format!("{question_id}_");
    let mut subcolumns = Vec::new();
    let mut text_columns = Vec::new();
    let mut found_any = false;

    for column in frame.columns() {
        if column == question_id || column.starts_with(&prefix) {
            if column.ends_with("_TEXT") {
                text_columns.push(column.clone());
            } else {
                subcolumns.push(column.clone());
            }
            found_any = true;
        } else if found_any {
            // End of the contiguous run for this question.
            break;
        }
    }

    subcolumns.sort();
    text_columns.sort();

    let column_indices: Vec<Option<usize>> = subcolumns
        .iter()
        .map(|name| frame.column_index(name))
        .collect();

    let mut responses = Vec::new();
    for row in 0..frame.row_count() {
        let values: Vec<Option<String>> = column_indices
            .iter()
            .map(|idx| idx.and_then(|i| frame.value_at(row, i)).map(str::to_string))
            .collect();
        if values.iter().any(Option::is_some) {
            responses.push((row, values));
        }
    }

    debug!(
        "Extracted question '{question_id}': {} subcolumn(s), {} text column(s), {} response row(s)",
        subcolumns.len(),
        text_columns.len(),
        responses.len()
    );

    Extraction {
        subcolumns,
        text_columns,
        responses,
    }
}

/// Flatten a multi-select question's single column: each cell holds
/// comma-separated choice codes, one code per returned entry.
pub fn flatten_multi_select(extraction: &Extraction, question_id: &str) -> Vec<(usize, String)> {
    extraction
        .column_values(question_id)
        .into_iter()
        .flat_map(|(row, raw)| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (row, s.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{DEFAULT_RESPONDENT_COLUMN, SurveyFrame};

    fn frame(columns: &[&str], rows: &[&[&str]]) -> SurveyFrame {
        SurveyFrame::from_parts(
            columns.iter().map(|c| c.to_string()).collect(),
            None,
            rows.iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
            DEFAULT_RESPONDENT_COLUMN,
        )
        .unwrap()
    }

    #[test]
    fn scan_stops_at_first_break_in_contiguity() {
        let frame = frame(
            &["ResponseId", "DE9", "DE9_1", "DE9_2", "OTHER_1", "DE9_3"],
            &[&["R_1", "1", "2", "3", "x", "4"]],
        );
        let extraction = extract("DE9", &frame);
        assert_eq!(extraction.subcolumns, vec!["DE9", "DE9_1", "DE9_2"]);
    }

    #[test]
    fn text_companions_are_partitioned_out() {
        let frame = frame(
            &["ResponseId", "DE3", "DE3_12_TEXT"],
            &[&["R_1", "1,12", "something else"]],
        );
        let extraction = extract("DE3", &frame);
        assert_eq!(extraction.subcolumns, vec!["DE3"]);
        assert_eq!(extraction.text_columns, vec!["DE3_12_TEXT"]);
    }

    #[test]
    fn fully_empty_respondents_are_dropped() {
        let frame = frame(
            &["ResponseId", "PL1_1", "PL1_2"],
            &[
                &["R_1", "1", ""],
                &["R_2", "", ""],
                &["R_3", "", "5"],
            ],
        );
        let extraction = extract("PL1", &frame);
        let rows: Vec<usize> = extraction.responses.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn numeric_view_discards_malformed_cells() {
        let frame = frame(
            &["ResponseId", "DE1"],
            &[&["R_1", "34"], &["R_2", "n/a"], &["R_3", "41.5"]],
        );
        let extraction = extract("DE1", &frame);
        let values: Vec<f64> = extraction
            .numeric_column_values("DE1")
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![34.0, 41.5]);
    }

    #[test]
    fn multi_select_cells_flatten_to_codes() {
        let frame = frame(
            &["ResponseId", "DE3"],
            &[&["R_1", "1,12"], &["R_2", "2"]],
        );
        let extraction = extract("DE3", &frame);
        let flat = flatten_multi_select(&extraction, "DE3");
        assert_eq!(
            flat,
            vec![
                (0, "1".to_string()),
                (0, "12".to_string()),
                (1, "2".to_string())
            ]
        );
    }
}
