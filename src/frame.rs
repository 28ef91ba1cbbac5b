//! In-memory survey export.
//!
//! A survey export is a wide CSV: the header row carries column ids
//! (`DE14_1`, `PL2_3_1`, ...), the first data row carries the literal
//! question text for each column, and every remaining row is one respondent.
//! [`SurveyFrame`] keeps both views: the question-text row for titles and the
//! working rows for decoding.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::debug;

use crate::io_utils;

pub const DEFAULT_RESPONDENT_COLUMN: &str = "ResponseId";

#[derive(Debug, Clone)]
pub struct SurveyFrame {
    columns: Vec<String>,
    question_texts: Vec<String>,
    rows: Vec<Vec<String>>,
    respondent_idx: usize,
}

impl SurveyFrame {
    pub fn load(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
        respondent_column: &str,
    ) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let columns = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading header row of {path:?}"))?;

        let mut question_texts = vec![String::new(); columns.len()];
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let mut decoded = io_utils::decode_record(&record, encoding)?;
            decoded.resize(columns.len(), String::new());
            if row_idx == 0 {
                question_texts = decoded;
            } else {
                rows.push(decoded);
            }
        }

        let respondent_idx = columns
            .iter()
            .position(|c| c == respondent_column)
            .ok_or_else(|| {
                anyhow!("Survey export {path:?} lacks respondent key column '{respondent_column}'")
            })?;

        debug!(
            "Loaded survey frame: {} column(s), {} respondent(s)",
            columns.len(),
            rows.len()
        );
        Ok(Self {
            columns,
            question_texts,
            rows,
            respondent_idx,
        })
    }

    /// Build a frame directly from parts. The question-text row is optional.
    pub fn from_parts(
        columns: Vec<String>,
        question_texts: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
        respondent_column: &str,
    ) -> Result<Self> {
        let respondent_idx = columns
            .iter()
            .position(|c| c == respondent_column)
            .ok_or_else(|| anyhow!("Missing respondent key column '{respondent_column}'"))?;
        let question_texts = question_texts.unwrap_or_else(|| vec![String::new(); columns.len()]);
        Ok(Self {
            columns,
            question_texts,
            rows,
            respondent_idx,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn respondent_id(&self, row: usize) -> &str {
        self.rows[row]
            .get(self.respondent_idx)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell value, `None` when the cell is blank or the column is absent.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        let cell = self.rows.get(row)?.get(idx)?.trim();
        if cell.is_empty() { None } else { Some(cell) }
    }

    pub fn value_at(&self, row: usize, column_idx: usize) -> Option<&str> {
        let cell = self.rows.get(row)?.get(column_idx)?.trim();
        if cell.is_empty() { None } else { Some(cell) }
    }

    /// Literal question text for a question id: the text row entry of the
    /// first column whose id matches the question, falling back to the id.
    pub fn question_text(&self, question_id: &str) -> String {
        let prefix = format!("{question_id}_");
        for (idx, col) in self.columns.iter().enumerate() {
            if col == question_id || col.starts_with(&prefix) {
                let text = self.question_texts[idx].trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        question_id.to_string()
    }
}
