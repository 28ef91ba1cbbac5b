//! Time-unit normalization.
//!
//! Duration answers arrive tagged with heterogeneous units (weeks, months,
//! quarters, semesters, years) and must be brought to a common unit before
//! binning. Two canonical targets exist, months and weeks, each with its own
//! fixed factor table.
//!
//! The strict entry point ([`to_common_unit`]) rejects unknown units with
//! [`UnitError::Unsupported`]; the `_lossy` variants keep the historical
//! fail-open behavior and return the input unchanged. Call sites pick their
//! semantics by name.

use thiserror::Error;

use crate::metadata::CodeMap;

#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("unsupported time unit '{unit}'")]
    Unsupported { unit: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Week,
    Month,
    Quarter,
    Semester,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonUnit {
    Months,
    Weeks,
}

impl TimeUnit {
    /// Parse a unit label: case-insensitive, ignores a trailing plural `s`.
    pub fn parse(label: &str) -> Option<Self> {
        let lowered = label.trim().to_ascii_lowercase();
        match lowered.strip_suffix('s').unwrap_or(&lowered) {
            "week" => Some(TimeUnit::Week),
            "month" => Some(TimeUnit::Month),
            "quarter" => Some(TimeUnit::Quarter),
            "semester" => Some(TimeUnit::Semester),
            "year" => Some(TimeUnit::Year),
            _ => None,
        }
    }

    /// Resolve a unit from either a label or a numeric code via the sub map.
    pub fn resolve(text: &str, sub_map: Option<&CodeMap>) -> Option<Self> {
        if let Some(unit) = TimeUnit::parse(text) {
            return Some(unit);
        }
        let code = text.trim().parse::<i64>().ok()?;
        let label = sub_map?.get(code)?;
        TimeUnit::parse(label)
    }

    pub fn factor(self, target: CommonUnit) -> f64 {
        match target {
            CommonUnit::Months => match self {
                TimeUnit::Week => 0.2301,
                TimeUnit::Month => 1.0,
                TimeUnit::Quarter => 3.0,
                TimeUnit::Semester => 6.0,
                TimeUnit::Year => 12.0,
            },
            CommonUnit::Weeks => match self {
                TimeUnit::Week => 1.0,
                TimeUnit::Month => 4.345,
                TimeUnit::Quarter => 13.035,
                TimeUnit::Semester => 26.07,
                TimeUnit::Year => 52.0,
            },
        }
    }
}

/// Strict conversion: unknown units are an error naming the offending unit.
pub fn to_common_unit(
    value: f64,
    unit_text: &str,
    sub_map: Option<&CodeMap>,
    target: CommonUnit,
) -> Result<f64, UnitError> {
    let unit = TimeUnit::resolve(unit_text, sub_map).ok_or_else(|| UnitError::Unsupported {
        unit: unit_text.to_string(),
    })?;
    Ok(value * unit.factor(target))
}

/// Fail-open conversion: unknown units pass the value through unchanged.
pub fn to_common_unit_lossy(
    value: f64,
    unit_text: &str,
    sub_map: Option<&CodeMap>,
    target: CommonUnit,
) -> f64 {
    match TimeUnit::resolve(unit_text, sub_map) {
        Some(unit) => value * unit.factor(target),
        None => value,
    }
}

/// Legacy scalar converter: months to whole weeks, fail-open.
pub fn months_to_weeks_lossy(months: f64) -> f64 {
    (months * TimeUnit::Month.factor(CommonUnit::Weeks)).round()
}
