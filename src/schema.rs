//! Column-name schema parser.
//!
//! Survey columns encode a multi-level schema positionally:
//! `<QuestionId>[_<Row>][_<Sub>][_TEXT]`. Which suffix positions exist is
//! declared per question as a [`ColumnFormat`]; parsing never guesses from
//! the digits themselves. Row comes before sub, and a sub-only question still
//! consumes the first remaining segment as the sub code.
//!
//! Parsing is total: a segment that fails to parse or a code missing from its
//! map degrades to `None` / a stringified code. Upstream iterates many
//! columns and a partial decode is still usable.

use crate::metadata::{CodeMap, ColumnFormat};

/// Structural decomposition of a single column name. Ephemeral, recomputed
/// per column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedColumn {
    pub question_id: String,
    pub row: Option<i64>,
    pub row_label: Option<String>,
    pub sub: Option<i64>,
    pub sub_label: Option<String>,
    pub is_text: bool,
}

impl ParsedColumn {
    fn bare(question_id: &str, is_text: bool) -> Self {
        Self {
            question_id: question_id.to_string(),
            is_text,
            ..Default::default()
        }
    }

    /// Display label: row and sub joined when both are present, otherwise
    /// whichever exists.
    pub fn display_label(&self, fallback: &str) -> String {
        match (&self.row_label, &self.sub_label) {
            (Some(row), Some(sub)) => format!("{row} — {sub}"),
            (Some(row), None) => row.clone(),
            (None, Some(sub)) => sub.clone(),
            (None, None) => fallback.to_string(),
        }
    }
}

pub fn parse_column(
    column: &str,
    question_id: &str,
    format: ColumnFormat,
    row_map: &CodeMap,
    sub_map: &CodeMap,
) -> ParsedColumn {
    if column == question_id || column.ends_with("_TEXT") {
        return ParsedColumn::bare(question_id, column.ends_with("_TEXT"));
    }

    let mut parsed = ParsedColumn::bare(question_id, false);
    let prefix = format!("{question_id}_");
    let Some(remainder) = column.strip_prefix(&prefix) else {
        return parsed;
    };
    let mut segments = remainder.split('_');

    let (take_row, take_sub) = match format {
        ColumnFormat::Flat => (false, false),
        ColumnFormat::RowOnly => (true, false),
        ColumnFormat::SubOnly => (false, true),
        ColumnFormat::RowSub => (true, true),
    };

    if take_row {
        match segments.next().map(str::parse::<i64>) {
            Some(Ok(code)) => {
                parsed.row = Some(code);
                parsed.row_label = Some(row_map.label_or_code(code));
            }
            // Unparsable segment: leave row unset and stop consuming.
            _ => return parsed,
        }
    }
    if take_sub {
        if let Some(Ok(code)) = segments.next().map(str::parse::<i64>) {
            parsed.sub = Some(code);
            parsed.sub_label = Some(sub_map.label_or_code(code));
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataStore;

    #[test]
    fn bare_and_text_columns_have_no_structure() {
        let store = MetadataStore::builtin();
        let meta = store.get("PL2");
        let parsed = parse_column("PL2", "PL2", meta.column_format(), &meta.row_map, &meta.sub_map);
        assert_eq!(parsed.row, None);
        assert!(!parsed.is_text);

        let parsed = parse_column(
            "PL2_5_TEXT",
            "PL2",
            meta.column_format(),
            &meta.row_map,
            &meta.sub_map,
        );
        assert!(parsed.is_text);
        assert_eq!(parsed.row, None);
    }

    #[test]
    fn row_then_sub_is_positional() {
        let store = MetadataStore::builtin();
        let meta = store.get("PL2");
        let parsed = parse_column(
            "PL2_3_1",
            "PL2",
            meta.column_format(),
            &meta.row_map,
            &meta.sub_map,
        );
        assert_eq!(parsed.row, Some(3));
        assert_eq!(parsed.row_label.as_deref(), Some("Assistant professors"));
        assert_eq!(parsed.sub, Some(1));
        assert_eq!(parsed.sub_label.as_deref(), Some("Weeks"));
    }

    #[test]
    fn sub_only_question_consumes_first_segment_as_sub() {
        let store = MetadataStore::builtin();
        let meta = store.get("DE14");
        let parsed = parse_column(
            "DE14_2",
            "DE14",
            meta.column_format(),
            &meta.row_map,
            &meta.sub_map,
        );
        assert_eq!(parsed.row, None);
        assert_eq!(parsed.sub, Some(2));
        assert_eq!(parsed.sub_label.as_deref(), Some("Parent 2"));
    }

    #[test]
    fn map_miss_falls_back_to_code_string() {
        let store = MetadataStore::builtin();
        let meta = store.get("PL1");
        let parsed = parse_column(
            "PL1_9",
            "PL1",
            meta.column_format(),
            &meta.row_map,
            &meta.sub_map,
        );
        assert_eq!(parsed.row, Some(9));
        assert_eq!(parsed.row_label.as_deref(), Some("9"));
    }

    #[test]
    fn unparsable_segment_degrades_to_none() {
        let store = MetadataStore::builtin();
        let meta = store.get("PL1");
        let parsed = parse_column(
            "PL1_abc",
            "PL1",
            meta.column_format(),
            &meta.row_map,
            &meta.sub_map,
        );
        assert_eq!(parsed.row, None);
        assert_eq!(parsed.row_label, None);
    }

    #[test]
    fn display_label_prefers_row_and_sub() {
        let parsed = ParsedColumn {
            question_id: "PL2".into(),
            row: Some(1),
            row_label: Some("PhD students".into()),
            sub: Some(2),
            sub_label: Some("Months".into()),
            is_text: false,
        };
        assert_eq!(parsed.display_label("PL2_1_2"), "PhD students — Months");
    }
}
