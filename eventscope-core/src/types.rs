//! Core domain types for eventscope
//!
//! Rows arrive from a CSV-like source with no known schema. Each row is an
//! ordered set of named cells, and the order matters: the first numeric cell
//! (after the timestamp column) becomes the row's value.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **RawRow** | One physical CSV line, cells keyed by header name, in header order |
//! | **FieldValue** | A dynamically typed cell: number, text, or empty |
//! | **Instant** | An absolute point in time, always `DateTime<Utc>` |
//! | **IngestedRow** | A row whose timestamp column resolved to an instant |

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

// ============================================
// Field values
// ============================================

/// A single dynamically typed cell.
///
/// Plainly numeric cells are coerced to [`FieldValue::Number`] when read, the
/// same way dynamic-typing CSV parsers do. Everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Empty,
}

impl FieldValue {
    /// Coerce a raw CSV cell: blank → `Empty`, finite number → `Number`, else `Text`.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return FieldValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(trimmed.to_string()),
        }
    }

    /// The value as a finite number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Whether the cell carries nothing (empty, or whitespace-only text).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// Stringified, trimmed form used by datetime parsing.
    ///
    /// Returns `None` for empty cells. Integral numbers render without a
    /// fractional part so an epoch read as a number still looks like
    /// `1704067200`.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Empty => None,
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Cow::Borrowed(trimmed))
                }
            }
            FieldValue::Number(n) => Some(Cow::Owned(format_number(*n))),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

// ============================================
// Raw rows
// ============================================

/// One input row: named cells in their original column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, FieldValue)>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `n` cells.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: Vec::with_capacity(n),
        }
    }

    /// Append a cell. A repeated name overwrites the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a cell by column name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Column names in original order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Cells in original order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RawRowVisitor;

impl<'de> Visitor<'de> for RawRowVisitor {
    type Value = RawRow;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column name to scalar")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRow, A::Error> {
        let mut row = RawRow::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, FieldValue>()? {
            row.insert(k, v);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawRowVisitor)
    }
}

// ============================================
// Ingested rows
// ============================================

/// A row that survived timestamp resolution.
///
/// Never mutated after ingestion; downstream consumers share it read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedRow {
    /// Resolved instant of the detected timestamp column
    pub timestamp: DateTime<Utc>,
    /// First numeric non-timestamp cell, or 1.0 (count the row once)
    pub value: f64,
    /// The original cells
    pub fields: RawRow,
}
