use std::fmt;

use serde_json::{Map, Value};

/// One step of a [`JsonPath`]: an object key or an array position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Dotted lookup path such as `chart.result[0].meta`.
///
/// Every step yields an `Option`, so a missing key, an out-of-range index or a
/// value of the wrong type all end the walk with `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse `a.b[0].c`. Returns `None` for empty keys or malformed brackets.
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for part in text.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if key.is_empty() && segments.is_empty() && rest.is_empty() {
                return None;
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            } else if rest.is_empty() {
                return None;
            }
            while !rest.is_empty() {
                let close = rest.find(']')?;
                if !rest.starts_with('[') {
                    return None;
                }
                let index = rest[1..close].trim().parse::<usize>().ok()?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
            }
        }
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |cursor, segment| step(cursor, segment))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if idx == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn step<'a>(cursor: &'a Value, segment: &Segment) -> Option<&'a Value> {
    let next = match segment {
        Segment::Key(key) => cursor.as_object()?.get(key),
        Segment::Index(index) => cursor.as_array()?.get(*index),
    }?;
    // `null` is treated as absent at every level.
    if next.is_null() {
        None
    } else {
        Some(next)
    }
}

pub fn as_text(value: &Value) -> Option<&str> {
    value.as_str()
}

pub fn as_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

pub fn non_empty_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object().filter(|map| !map.is_empty())
}

/// Render a scalar for display. Strings are shown unquoted and `null` as empty.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Two-decimal rendering for numbers, plain text for anything else.
pub fn format_decimal(value: &Value) -> String {
    match value.as_f64() {
        Some(number) => format!("{number:.2}"),
        None => value_to_string(value),
    }
}
