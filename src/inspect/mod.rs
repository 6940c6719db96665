//! Defensive rendering of loosely structured API responses.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::AppError;

pub mod path;

pub use path::{JsonPath, Segment};

use self::path::{as_array, as_text, format_decimal, non_empty_object, value_to_string};

/// Upper bound on the characters a raw dump keeps.
pub const RAW_DUMP_LIMIT: usize = 2000;

pub const NO_DATA: &str = "no data";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    ChartSummary,
    InsightsSummary,
    HoldersSummary,
    RawDump,
}

impl View {
    pub const ALL: [View; 4] = [
        View::ChartSummary,
        View::InsightsSummary,
        View::HoldersSummary,
        View::RawDump,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::ChartSummary => "chart-summary",
            View::InsightsSummary => "insights-summary",
            View::HoldersSummary => "holders-summary",
            View::RawDump => "raw-dump",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = View::ALL.iter().map(View::as_str).collect();
                AppError::message(format!(
                    "unknown view `{s}`, expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Outcome of applying a [`View`] to a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InspectionResult {
    pub success: bool,
    pub fields: Vec<(String, String)>,
    pub error_message: Option<String>,
}

impl InspectionResult {
    pub fn success(fields: Vec<(String, String)>) -> Self {
        Self {
            success: true,
            fields,
            error_message: None,
        }
    }

    pub fn failure<T: Into<String>>(message: T) -> Self {
        Self {
            success: false,
            fields: Vec::new(),
            error_message: Some(message.into()),
        }
    }

    /// Wrap a collaborator fault so it reads the same way as any other failed view.
    pub fn from_fault(err: &AppError) -> Self {
        Self::failure(format!("API error: {}", err.describe()))
    }

    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value.as_str())
    }
}

/// Apply `view` to `response`. Never panics; every shortfall becomes a failed result.
pub fn inspect(response: Option<&Value>, view: View) -> InspectionResult {
    inspect_with_limit(response, view, RAW_DUMP_LIMIT)
}

/// Same as [`inspect`] with a caller-chosen raw dump limit.
pub fn inspect_with_limit(
    response: Option<&Value>,
    view: View,
    dump_limit: usize,
) -> InspectionResult {
    let Some(response) = response.filter(|value| !value.is_null()) else {
        return InspectionResult::failure(NO_DATA);
    };

    match view {
        View::ChartSummary => chart_summary(response),
        View::InsightsSummary => insights_summary(response),
        View::HoldersSummary => holders_summary(response),
        View::RawDump => raw_dump(response, dump_limit),
    }
}

fn chart_summary(response: &Value) -> InspectionResult {
    let meta = lookup(response, "chart.result[0].meta");
    let Some(meta) = meta.filter(|meta| meta.is_object()) else {
        return InspectionResult::failure(NO_DATA);
    };

    let Some(symbol) = meta.get("symbol").and_then(as_text) else {
        return InspectionResult::failure("missing required field: symbol");
    };

    let text_or_default = |key: &str| {
        meta.get(key)
            .filter(|value| !value.is_null())
            .map(value_to_string)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    let decimal_or_default = |key: &str| {
        meta.get(key)
            .filter(|value| !value.is_null())
            .map(format_decimal)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    InspectionResult::success(vec![
        ("symbol".to_string(), symbol.to_string()),
        ("longName".to_string(), text_or_default("longName")),
        ("exchangeName".to_string(), text_or_default("exchangeName")),
        (
            "regularMarketPrice".to_string(),
            decimal_or_default("regularMarketPrice"),
        ),
        (
            "fiftyTwoWeekHigh".to_string(),
            decimal_or_default("fiftyTwoWeekHigh"),
        ),
        (
            "fiftyTwoWeekLow".to_string(),
            decimal_or_default("fiftyTwoWeekLow"),
        ),
    ])
}

fn insights_summary(response: &Value) -> InspectionResult {
    match non_empty_object(response) {
        Some(map) => count_field("fieldCount", map.len()),
        None => InspectionResult::failure(NO_DATA),
    }
}

fn holders_summary(response: &Value) -> InspectionResult {
    let holders = lookup(response, "quoteSummary.result[0].institutionalHolders.holders");
    match holders.and_then(as_array) {
        Some(holders) => count_field("holderCount", holders.len()),
        None => InspectionResult::failure(NO_DATA),
    }
}

fn count_field(label: &str, count: usize) -> InspectionResult {
    InspectionResult::success(vec![(label.to_string(), count.to_string())])
}

fn raw_dump(response: &Value, limit: usize) -> InspectionResult {
    let full = match serde_json::to_string_pretty(response) {
        Ok(text) => text,
        Err(err) => {
            return InspectionResult::failure(format!("failed to serialize response: {err}"));
        }
    };

    let (text, truncated) = truncate_chars(&full, limit);
    let mut fields = vec![("raw".to_string(), text.to_string())];
    if truncated {
        fields.push(("truncated".to_string(), "true".to_string()));
    }
    InspectionResult::success(fields)
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    JsonPath::parse(path).and_then(|path| path.lookup(root))
}

/// Keep at most `limit` characters without splitting a code point.
fn truncate_chars(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
