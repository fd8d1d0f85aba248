//! Cell values as returned by the spreadsheet service.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One cell of a range read.
///
/// The service returns strings for formatted values but raw numbers and
/// booleans may come through unformatted, so both shapes are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(Number),
    Bool(bool),
}

/// A ragged row: trailing blank cells are omitted by the service.
pub type Row = Vec<Cell>;

impl Cell {
    /// The cell's text, only when it was returned as a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// `true` for an empty string cell. Numbers and booleans are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(text) if text.is_empty())
    }

    /// `true` when the cell is text and contains `needle`, ignoring case.
    pub fn text_contains(&self, needle: &str) -> bool {
        self.as_text()
            .is_some_and(|text| text.to_lowercase().contains(needle))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(text) => Value::String(text.clone()),
            Cell::Number(number) => Value::Number(number.clone()),
            Cell::Bool(flag) => Value::Bool(*flag),
        }
    }
}

/// String coercion used for every identifier comparison.
impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(number) => write!(f, "{number}"),
            Cell::Bool(true) => f.write_str("TRUE"),
            Cell::Bool(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(Number::from(value))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// The cell at `index`, if the ragged row is long enough.
pub fn cell_at(row: &[Cell], index: usize) -> Option<&Cell> {
    row.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mixed_values_row() {
        let row: Row = serde_json::from_str(r#"["15009", 19129, 2.5, true]"#).unwrap();
        assert_eq!(row[0], Cell::from("15009"));
        assert_eq!(row[1], Cell::from(19129));
        assert_eq!(row[2].to_string(), "2.5");
        assert_eq!(row[3], Cell::Bool(true));
    }

    #[test]
    fn numbers_and_text_coerce_to_the_same_identifier() {
        assert_eq!(Cell::from(15009).to_string(), Cell::from("15009").to_string());
    }

    #[test]
    fn contains_is_case_insensitive_and_text_only() {
        assert!(Cell::from("Student Components").text_contains("component"));
        assert!(!Cell::from(7).text_contains("7"));
    }
}
