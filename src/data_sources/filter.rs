//! Filtering and sorting of data source records.
//!
//! Records are JSON objects. A filter names an attribute, a list of
//! values and how they are compared. Filters combine with AND. Within a
//! filter, values combine with OR unless `all` is set. A list attribute
//! matches a value when any of its elements does.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, AttributeFlags, Block, NestedBlock};

/// How a filter compares values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBy {
    /// Equal to the value.
    Exact,
    /// Equal to one of the values.
    #[default]
    In,
    /// Contains the value.
    Substring,
    /// Numerically less than the value.
    LessThan,
    /// Numerically greater than the value.
    GreaterThan,
}

/// One `filter` block.
#[derive(Debug, Clone, Deserialize)]
pub struct Filter {
    /// Record attribute to test.
    pub attribute: String,
    /// Values to compare against.
    pub values: Vec<String>,
    /// Comparison.
    #[serde(default, deserialize_with = "null_default")]
    pub match_by: MatchBy,
    /// Require every value to match instead of any.
    #[serde(default, deserialize_with = "null_default")]
    pub all: bool,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// One `sort` block.
#[derive(Debug, Clone, Deserialize)]
pub struct Sort {
    /// Record attribute to sort by.
    pub attribute: String,
    /// Sort direction.
    #[serde(default, deserialize_with = "null_default")]
    pub direction: Direction,
}

fn null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Schema of the `filter` block.
pub fn filter_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute("attribute", Attribute::required_string())
            .with_attribute(
                "values",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::required(),
                ),
            )
            .with_attribute(
                "match_by",
                Attribute::optional_string().with_description(
                    "exact, in, substring, less_than or greater_than. Defaults to in.",
                ),
            )
            .with_attribute("all", Attribute::optional_bool()),
    )
}

/// Schema of the `sort` block.
pub fn sort_block() -> NestedBlock {
    NestedBlock::list(
        Block::new()
            .with_attribute("attribute", Attribute::required_string())
            .with_attribute(
                "direction",
                Attribute::optional_string().with_description("asc or desc"),
            ),
    )
}

fn parse_blocks<T: for<'de> Deserialize<'de>>(
    config: &Value,
    key: &str,
) -> Result<Vec<T>, ProviderError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ProviderError::Validation(format!("invalid {} block: {}", key, e))),
    }
}

/// Read the `filter` blocks of a configuration.
pub fn parse_filters(config: &Value) -> Result<Vec<Filter>, ProviderError> {
    parse_blocks(config, "filter")
}

/// Read the `sort` blocks of a configuration.
pub fn parse_sorts(config: &Value) -> Result<Vec<Sort>, ProviderError> {
    parse_blocks(config, "sort")
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_matches(element: &Value, wanted: &str, match_by: MatchBy) -> bool {
    match match_by {
        MatchBy::Exact | MatchBy::In => scalar_string(element).is_some_and(|s| s == wanted),
        MatchBy::Substring => scalar_string(element).is_some_and(|s| s.contains(wanted)),
        MatchBy::LessThan | MatchBy::GreaterThan => {
            let (Some(have), Ok(limit)) = (element.as_f64(), wanted.parse::<f64>()) else {
                return false;
            };
            if match_by == MatchBy::LessThan {
                have < limit
            } else {
                have > limit
            }
        },
    }
}

impl Filter {
    /// Whether a record passes this filter.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(value) = record.get(&self.attribute) else {
            return false;
        };
        let elements: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Null => return false,
            other => vec![other],
        };

        if self.match_by == MatchBy::Exact && value.is_array() {
            let mut have: Vec<String> = elements.iter().filter_map(|e| scalar_string(e)).collect();
            let mut want = self.values.clone();
            have.sort();
            want.sort();
            return have == want;
        }

        let value_matches = |wanted: &String| {
            elements
                .iter()
                .any(|element| scalar_matches(element, wanted, self.match_by))
        };
        if self.all {
            self.values.iter().all(value_matches)
        } else {
            self.values.iter().any(value_matches)
        }
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => scalar_string(a).cmp(&scalar_string(b)),
    }
}

/// Order two records by one sort block. Missing values go last in either direction.
fn compare_by(sort: &Sort, a: &Value, b: &Value) -> Ordering {
    let present = |record: &Value| record.get(&sort.attribute).filter(|v| !v.is_null()).cloned();
    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match sort.direction {
            Direction::Asc => compare(&x, &y),
            Direction::Desc => compare(&x, &y).reverse(),
        },
    }
}

/// Keep the records passing every filter, then sort them.
pub fn apply(records: Vec<Value>, filters: &[Filter], sorts: &[Sort]) -> Vec<Value> {
    let mut records: Vec<Value> = records
        .into_iter()
        .filter(|record| filters.iter().all(|f| f.matches(record)))
        .collect();

    records.sort_by(|a, b| {
        sorts
            .iter()
            .map(|s| compare_by(s, a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    records
}
