//! Question metadata store.
//!
//! One immutable [`QuestionMeta`] per question id: value/row/sub code maps,
//! plot type, grouping anchor, and optional fixed binning. The store is
//! loaded once at startup from the built-in instrument tables, optionally
//! merged with a JSON override file, and read-only thereafter. A lookup miss
//! yields a default entry (empty maps, continuous plot) so unknown questions
//! still produce a best-effort distribution.

use std::{collections::HashMap, fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Ordered code → label map. Insertion order is display order, so this is a
/// vector of pairs rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeMap(Vec<(i64, String)>);

impl CodeMap {
    pub fn from_pairs(pairs: &[(i64, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(code, label)| (*code, (*label).to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, code: i64) -> Option<&str> {
        self.0
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| label.as_str())
    }

    /// Label for a code, falling back to the stringified code on a miss.
    pub fn label_or_code(&self, code: i64) -> String {
        self.get(code)
            .map(ToString::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    /// Reverse lookup, first match wins.
    pub fn code_of(&self, label: &str) -> Option<i64> {
        self.0
            .iter()
            .find(|(_, l)| l == label)
            .map(|(code, _)| *code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.0.iter().map(|(code, label)| (*code, label.as_str()))
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|(_, label)| label.clone()).collect()
    }

    /// True when every key is integral, which is always the case internally;
    /// retained as the gate for decoding numeric answer codes through the map.
    pub fn decodes_numeric_codes(&self) -> bool {
        !self.0.is_empty()
    }
}

// Legacy metadata files spell code maps as JSON objects with stringified
// integer keys. Accept both that form (in document order) and an array of
// [code, label] pairs; keys are canonical i64 from here on.
impl<'de> Deserialize<'de> for CodeMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CodeMapVisitor;

        impl<'de> Visitor<'de> for CodeMapVisitor {
            type Value = CodeMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of code→label or an array of [code, label] pairs")
            }

            fn visit_map<A>(self, mut access: A) -> Result<CodeMap, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((key, label)) = access.next_entry::<String, String>()? {
                    let code = key.trim().parse::<i64>().map_err(|_| {
                        de::Error::custom(format!("code map key '{key}' is not an integer"))
                    })?;
                    pairs.push((code, label));
                }
                Ok(CodeMap(pairs))
            }

            fn visit_seq<A>(self, mut access: A) -> Result<CodeMap, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((code, label)) = access.next_element::<(i64, String)>()? {
                    pairs.push((code, label));
                }
                Ok(CodeMap(pairs))
            }
        }

        deserializer.deserialize_any(CodeMapVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    Categorical,
    #[default]
    Continuous,
    Average,
}

/// What a tidy record's group label represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    None,
    Row,
    ParentGender,
}

/// Declared column-name shape for one question. Derived once from the
/// configured maps; the parser never guesses from digits at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnFormat {
    Flat,
    RowOnly,
    SubOnly,
    RowSub,
}

impl ColumnFormat {
    pub fn infer(row_map: &CodeMap, sub_map: &CodeMap) -> Self {
        match (row_map.is_empty(), sub_map.is_empty()) {
            (false, false) => ColumnFormat::RowSub,
            (false, true) => ColumnFormat::RowOnly,
            (true, false) => ColumnFormat::SubOnly,
            (true, true) => ColumnFormat::Flat,
        }
    }
}

/// Fixed-edge binning policy for duration-style questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinSpec {
    /// Half-open `[lo, hi)` edges; the final edge may be `null` meaning +∞.
    pub edges: Vec<Option<f64>>,
    pub labels: Vec<String>,
    /// Values are clipped into `[clip_min, clip_max]` before binning.
    pub clip_min: f64,
    pub clip_max: f64,
    /// Axis label for the canonical unit ("Months", "Weeks").
    pub unit_label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionMeta {
    pub value_map: CodeMap,
    pub row_map: CodeMap,
    pub sub_map: CodeMap,
    pub plot_type: PlotType,
    pub anchor: Anchor,
    pub binning: Option<BinSpec>,
    /// The sub axis encodes a time unit to be normalized before binning.
    pub sub_is_unit: bool,
    /// Flat question whose single column holds comma-separated choice codes.
    pub multi_select: bool,
    /// Paired-column matrix: per row, sub 1 is a birth year and sub 2 a
    /// country code (DE23-style).
    pub birth_matrix: bool,
    pub swap_axes: bool,
    pub x_label: Option<String>,
}

impl QuestionMeta {
    pub fn column_format(&self) -> ColumnFormat {
        ColumnFormat::infer(&self.row_map, &self.sub_map)
    }
}

/// Read-only lookup from question id to metadata.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: HashMap<String, QuestionMeta>,
}

impl MetadataStore {
    /// Metadata entry for a question; misses yield the default entry.
    pub fn get(&self, question_id: &str) -> QuestionMeta {
        self.entries.get(question_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn question_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn insert(&mut self, question_id: &str, meta: QuestionMeta) {
        self.entries.insert(question_id.to_string(), meta);
    }

    /// Merge a JSON override file (question id → [`QuestionMeta`]) over the
    /// current entries. Overrides replace whole entries.
    pub fn load_overrides(&mut self, path: &Path) -> Result<()> {
        let file =
            File::open(path).with_context(|| format!("Opening metadata file {path:?}"))?;
        let reader = BufReader::new(file);
        let overrides: HashMap<String, QuestionMeta> = serde_json::from_reader(reader)
            .with_context(|| format!("Parsing metadata JSON {path:?}"))?;
        self.entries.extend(overrides);
        Ok(())
    }

    /// The survey instrument's static tables.
    pub fn builtin() -> Self {
        let mut store = MetadataStore::default();

        store.insert("DE2", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "Woman"),
                (2, "Man"),
                (3, "Non-binary person"),
                (4, "Prefer not to answer"),
            ]),
            plot_type: PlotType::Categorical,
            ..Default::default()
        });

        store.insert("DE3", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "Western Europe (e.g., Greece, Sweden, United Kingdom)"),
                (2, "Eastern Europe (e.g., Hungary, Poland, Russia)"),
                (3, "North Africa (e.g., Egypt, Morocco, Sudan)"),
                (4, "Sub-Saharan Africa (e.g., Kenya, Nigeria, South Africa)"),
                (5, "West Asia / Middle East (e.g., Iran, Israel, Saudi Arabia)"),
                (6, "South and Southeast Asia (e.g., India, Indonesia, Singapore)"),
                (7, "East and Central Asia (e.g., China, Japan, Uzbekistan)"),
                (8, "Pacific / Oceania (e.g., Australia, Papua New Guinea, Fiji)"),
                (9, "North America (Canada, United States)"),
                (10, "Central America and Caribbean (e.g., Jamaica, Mexico, Panama)"),
                (11, "South America (e.g., Brazil, Chile, Colombia)"),
                (12, "Self describe"),
                (13, "Prefer not to answer"),
            ]),
            plot_type: PlotType::Categorical,
            multi_select: true,
            ..Default::default()
        });

        store.insert("DE4", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "We struggled to meet basic needs (food, shelter, clothing)."),
                (2, "We met basic needs but had little extra for other things."),
                (3, "We were comfortable and could afford some extras beyond our basic needs."),
                (4, "We were well-off and could easily afford many extras and savings."),
                (5, "Prefer not to say."),
            ]),
            plot_type: PlotType::Categorical,
            ..Default::default()
        });

        let country = QuestionMeta {
            value_map: country_map(),
            plot_type: PlotType::Categorical,
            ..Default::default()
        };
        store.insert("DE5", country.clone());
        store.insert("DE6", country);

        store.insert("DE1", QuestionMeta {
            plot_type: PlotType::Continuous,
            x_label: Some("Age".to_string()),
            ..Default::default()
        });
        store.insert("DE22", QuestionMeta {
            plot_type: PlotType::Continuous,
            x_label: Some("Number of children".to_string()),
            ..Default::default()
        });

        // Parent matrices: one column per parent, grouped by parent gender.
        // DE14 is the gender anchor itself.
        let parent_gender_values = CodeMap::from_pairs(&[
            (1, "Woman"),
            (2, "Man"),
            (3, "Non-binary person"),
        ]);
        store.insert("DE14", QuestionMeta {
            value_map: parent_gender_values.clone(),
            sub_map: CodeMap::from_pairs(&[(1, "Parent 1"), (2, "Parent 2")]),
            plot_type: PlotType::Categorical,
            anchor: Anchor::ParentGender,
            ..Default::default()
        });
        store.insert("DE15", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "No formal education"),
                (2, "Primary education"),
                (3, "Secondary education"),
                (4, "Vocational training"),
                (5, "Bachelor's degree"),
                (6, "Master's degree"),
                (7, "Doctorate"),
                (8, "Don't know"),
            ]),
            sub_map: CodeMap::from_pairs(&[(1, "Parent 1"), (2, "Parent 2")]),
            plot_type: PlotType::Categorical,
            anchor: Anchor::ParentGender,
            ..Default::default()
        });
        store.insert("DE16", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "Employed full-time"),
                (2, "Employed part-time"),
                (3, "Self-employed"),
                (4, "Homemaker"),
                (5, "Unemployed"),
                (6, "Don't know"),
            ]),
            sub_map: CodeMap::from_pairs(&[(1, "Parent 1"), (2, "Parent 2")]),
            plot_type: PlotType::Categorical,
            anchor: Anchor::ParentGender,
            ..Default::default()
        });

        // Birth year and country per child. Sub 1 = year, sub 2 = country.
        store.insert("DE23", QuestionMeta {
            value_map: country_map(),
            row_map: ordinal_children(10),
            sub_map: CodeMap::from_pairs(&[(1, "Year"), (2, "Country")]),
            plot_type: PlotType::Categorical,
            anchor: Anchor::Row,
            birth_matrix: true,
            ..Default::default()
        });

        let career_rows = CodeMap::from_pairs(&[
            (1, "PhD students"),
            (2, "Postdocs"),
            (3, "Assistant professors"),
            (4, "Associate professors"),
            (5, "Full professors"),
        ]);
        store.insert("PL1", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "No"),
                (2, "Yes, teaching relief only"),
                (3, "Yes, teaching and service relief"),
                (4, "Yes, full relief of duties"),
                (5, "Don't know"),
            ]),
            row_map: career_rows.clone(),
            plot_type: PlotType::Categorical,
            anchor: Anchor::Row,
            ..Default::default()
        });

        // Paid-leave duration: row = career stage, sub = reported time unit.
        // Normalized to months, then fixed duration bins.
        store.insert("PL2", QuestionMeta {
            row_map: career_rows,
            sub_map: CodeMap::from_pairs(&[
                (1, "Weeks"),
                (2, "Months"),
                (3, "Quarters"),
                (4, "Semesters"),
            ]),
            plot_type: PlotType::Continuous,
            anchor: Anchor::Row,
            sub_is_unit: true,
            binning: Some(BinSpec {
                edges: vec![
                    Some(0.0),
                    Some(2.0),
                    Some(4.0),
                    Some(7.0),
                    Some(13.0),
                    Some(19.0),
                    Some(25.0),
                    Some(37.0),
                    None,
                ],
                labels: vec![
                    "0–1".to_string(),
                    "2–3".to_string(),
                    "4–6".to_string(),
                    "7–12".to_string(),
                    "13–18".to_string(),
                    "19–24".to_string(),
                    "25–36".to_string(),
                    "37+".to_string(),
                ],
                clip_min: 0.0,
                clip_max: 60.0,
                unit_label: "Months".to_string(),
            }),
            ..Default::default()
        });

        store.insert("PL10", QuestionMeta {
            value_map: CodeMap::from_pairs(&[
                (1, "Yes, much better"),
                (2, "Yes, slightly better"),
                (3, "Just the bare minimum"),
                (4, "Don't know"),
            ]),
            plot_type: PlotType::Categorical,
            ..Default::default()
        });

        store
    }
}

fn ordinal_children(n: i64) -> CodeMap {
    let pairs: Vec<(i64, String)> = (1..=n)
        .map(|i| {
            let suffix = match i {
                1 => "st",
                2 => "nd",
                3 => "rd",
                _ => "th",
            };
            (i, format!("Your {i}{suffix} child"))
        })
        .collect();
    CodeMap(pairs)
}

/// Country codes for the residence and birth-country questions, alphabetical.
fn country_map() -> CodeMap {
    let names = [
        "Albania", "Argentina", "Armenia", "Australia", "Austria", "Azerbaijan",
        "Belarus", "Belgium", "Bosnia and Herzegovina", "Brazil", "Bulgaria",
        "Canada", "Chile", "China", "Colombia", "Croatia", "Cyprus",
        "Czech Republic", "Denmark", "Egypt", "Estonia", "Finland", "France",
        "Georgia", "Germany", "Greece", "Hungary", "Iceland", "India",
        "Indonesia", "Iran", "Ireland", "Israel", "Italy", "Japan",
        "Kazakhstan", "Kenya", "Latvia", "Lithuania", "Luxembourg", "Malta",
        "Mexico", "Moldova", "Montenegro", "Morocco", "Netherlands",
        "New Zealand", "Nigeria", "North Macedonia", "Norway", "Poland",
        "Portugal", "Romania", "Russia", "Saudi Arabia", "Serbia",
        "Serbia and Montenegro", "Singapore", "Slovakia", "Slovenia",
        "South Africa", "South Korea", "Spain", "Sweden", "Switzerland",
        "Turkey", "Ukraine", "United Kingdom", "United States", "Uruguay",
        "Uzbekistan", "Vietnam",
    ];
    CodeMap(
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as i64 + 1, (*name).to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_question_yields_default_entry() {
        let store = MetadataStore::builtin();
        let meta = store.get("ZZ99");
        assert!(meta.value_map.is_empty());
        assert_eq!(meta.plot_type, PlotType::Continuous);
        assert_eq!(meta.anchor, Anchor::None);
    }

    #[test]
    fn code_map_falls_back_to_stringified_code() {
        let map = CodeMap::from_pairs(&[(1, "Woman"), (2, "Man")]);
        assert_eq!(map.label_or_code(2), "Man");
        assert_eq!(map.label_or_code(9), "9");
    }

    #[test]
    fn code_map_accepts_string_keyed_objects() {
        let map: CodeMap = serde_json::from_str(r#"{"1": "Weeks", "2": "Months"}"#).unwrap();
        assert_eq!(map.get(1), Some("Weeks"));
        assert_eq!(map.get(2), Some("Months"));

        let map: CodeMap = serde_json::from_str(r#"[[1, "Weeks"], [2, "Months"]]"#).unwrap();
        assert_eq!(map.get(2), Some("Months"));

        assert!(serde_json::from_str::<CodeMap>(r#"{"one": "Weeks"}"#).is_err());
    }

    #[test]
    fn column_format_is_derived_from_configured_maps() {
        let store = MetadataStore::builtin();
        assert_eq!(store.get("PL2").column_format(), ColumnFormat::RowSub);
        assert_eq!(store.get("PL1").column_format(), ColumnFormat::RowOnly);
        assert_eq!(store.get("DE14").column_format(), ColumnFormat::SubOnly);
        assert_eq!(store.get("DE4").column_format(), ColumnFormat::Flat);
    }

    #[test]
    fn value_map_order_is_display_order() {
        let store = MetadataStore::builtin();
        let labels = store.get("DE2").value_map.labels();
        assert_eq!(labels[0], "Woman");
        assert_eq!(labels[3], "Prefer not to answer");
    }
}
