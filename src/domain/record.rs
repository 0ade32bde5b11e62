//! Log records handed to sinks.

use serde_json::{Map, Value};
use std::fmt;

/// Separator between fields of a rendered line.
const FIELD_SEPARATOR: char = '|';

/// Separator between a field label and its value.
const VALUE_SEPARATOR: char = '=';

/// A rendered access-log record.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// The rendered line, unchanged.
    Line(String),
    /// Field map parsed from a `key=value|key=value` line.
    Fields(Map<String, Value>),
}

impl LogRecord {
    /// Reinterprets a labelled, pipe-delimited line as a field map.
    ///
    /// Every segment must have the form `key=value` with a non-empty key;
    /// the value is everything after the first `=`. If any segment does not,
    /// the line is returned unchanged as [`LogRecord::Line`]. Repeated keys
    /// keep the last value.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let record = LogRecord::normalize("cs-method=GET|sc-status=200".into());
    /// assert!(record.is_structured());
    ///
    /// let record = LogRecord::normalize("GET|/people|200".into());
    /// assert_eq!(record, LogRecord::Line("GET|/people|200".into()));
    /// ```
    pub fn normalize(line: String) -> Self {
        match parse_fields(&line) {
            Some(fields) => Self::Fields(fields),
            None => Self::Line(line),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Fields(_))
    }

    /// Flattens the record back into a `key=value|...` line.
    ///
    /// Field records are emitted in key order.
    pub fn to_line(&self) -> String {
        match self {
            Self::Line(line) => line.clone(),
            Self::Fields(fields) => fields
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => format!("{key}{VALUE_SEPARATOR}{s}"),
                    other => format!("{key}{VALUE_SEPARATOR}{other}"),
                })
                .collect::<Vec<_>>()
                .join(&FIELD_SEPARATOR.to_string()),
        }
    }

    /// Body sent to a sink: JSON for field records, the raw line otherwise.
    pub fn to_body(&self) -> String {
        match self {
            Self::Line(line) => line.clone(),
            Self::Fields(fields) => Value::Object(fields.clone()).to_string(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Line(_) => "text/plain",
            Self::Fields(_) => "application/json",
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_body())
    }
}

fn parse_fields(line: &str) -> Option<Map<String, Value>> {
    if line.is_empty() {
        return None;
    }

    let mut fields = Map::new();
    for segment in line.split(FIELD_SEPARATOR) {
        let (key, value) = segment.split_once(VALUE_SEPARATOR)?;
        if key.is_empty() {
            return None;
        }
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }

    Some(fields)
}
