//! Data models for tabular input.
//!
//! A [`Table`] is a read-only set of equally long, named columns of
//! [`Value`]s. Every analysis takes a `&Table` and looks its columns up by
//! name, so a typo in a column name surfaces as
//! [`AnalysisError::ColumnNotFound`] instead of a panic.

use crate::error::AnalysisError;
use anyhow::{bail, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell of a table.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag (e.g. a "booked" column).
    Boolean(bool),
    /// Whole number: counts and identifiers.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Free-form category label.
    Text(String),
    /// Absent value.
    Missing,
}

impl Value {
    /// Infer a value from a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        match trimmed {
            "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "None" => return Value::Missing,
            "true" | "True" | "TRUE" => return Value::Boolean(true),
            "false" | "False" | "FALSE" => return Value::Boolean(false),
            _ => {}
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }

        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    /// Returns true for [`Value::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view used when summing flag columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) | Value::Missing => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Integer(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::Missing => 3,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NaN"),
        }
    }
}

// Total order: booleans, then numbers (numerically), then text, then missing.
// An integer sorts before a float of the same magnitude so that the two are
// never considered equal.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Integer(a), Value::Float(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (Value::Float(a), Value::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Missing, Value::Missing) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Boolean(b) => b.hash(state),
            Value::Integer(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Value::Float(x) => {
                1u8.hash(state);
                x.to_bits().hash(state);
            }
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::parse(s)
    }
}

/// An immutable table of named columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    rows: usize,
}

impl Table {
    /// Build a table from `(name, values)` pairs.
    ///
    /// Fails on duplicate names or columns of different lengths.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Table {
            names: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
            rows,
        };

        for (name, values) in columns {
            if table.names.contains(&name) {
                bail!("Duplicate column name: {}", name);
            }
            if values.len() != rows {
                bail!(
                    "Column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    rows
                );
            }
            table.names.push(name);
            table.columns.push(values);
        }

        Ok(table)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in input order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns true if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Result<&[Value], AnalysisError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| AnalysisError::ColumnNotFound {
                column: name.to_string(),
                available: self.names.clone(),
            })
    }

    /// Build a table from string literals, inferring value types.
    #[cfg(test)]
    pub fn from_labels(columns: &[(&str, Vec<&str>)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| Value::parse(v)).collect(),
                )
            })
            .collect();
        Self::from_columns(columns).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("NA"), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::parse("True"), Value::Boolean(true));
        assert_eq!(Value::parse("false"), Value::Boolean(false));
        assert_eq!(Value::parse("42"), Value::Integer(42));
        assert_eq!(Value::parse(" 2.5 "), Value::Float(2.5));
        assert_eq!(Value::parse("desktop"), Value::Text("desktop".to_string()));
        assert_eq!(Value::parse("inf"), Value::Text("inf".to_string()));
    }

    #[test]
    fn test_value_ordering() {
        let mut values = vec![
            Value::Text("b".to_string()),
            Value::Float(1.5),
            Value::Missing,
            Value::Integer(2),
            Value::Boolean(true),
            Value::Text("a".to_string()),
            Value::Integer(1),
        ];
        values.sort();

        assert_eq!(
            values,
            vec![
                Value::Boolean(true),
                Value::Integer(1),
                Value::Float(1.5),
                Value::Integer(2),
                Value::Text("a".to_string()),
                Value::Text("b".to_string()),
                Value::Missing,
            ]
        );
    }

    #[test]
    fn test_integer_and_float_are_distinct() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert!(Value::Integer(1) < Value::Float(1.0));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Missing.to_string(), "NaN");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::from_labels(&[("a", vec!["x", "y"]), ("b", vec!["1", ""])]);
        assert_eq!(table.len(), 2);
        assert!(table.has_column("b"));
        assert_eq!(table.column("b").unwrap()[1], Value::Missing);

        let err = table.column("c").unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound { ref column, .. } if column == "c"));
    }

    #[test]
    fn test_from_columns_rejects_mismatched_lengths() {
        let result = Table::from_columns(vec![
            ("a".to_string(), vec![Value::Integer(1)]),
            ("b".to_string(), vec![]),
        ]);
        assert!(result.is_err());

        let result = Table::from_columns(vec![
            ("a".to_string(), vec![Value::Integer(1)]),
            ("a".to_string(), vec![Value::Integer(2)]),
        ]);
        assert!(result.is_err());
    }
}
