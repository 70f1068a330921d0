//! Row filtering
//!
//! Two filter forms:
//! - basic: a paper number or a case-insensitive title substring
//! - structured: text starting with `+`, clauses `property op value` joined
//!   by `AND` and `OR` (`AND` binds tighter), values optionally quoted
//!
//! Properties are short names resolved through a `PropertyAllowList` to
//! JSON pointers into the serialized row; a `*` segment fans out over an
//! array. A clause holds when any resolved value satisfies it, except `!=`
//! which holds when no value equals.

use crate::aggregator::PaperRow;
use orc_common::VenueConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown filter property '{0}'")]
    UnknownProperty(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Unknown message target '{0}'")]
    UnknownTarget(String),
}

/// Short property name → JSON pointer into a serialized `PaperRow`
#[derive(Debug, Clone, Default)]
pub struct PropertyAllowList(BTreeMap<String, String>);

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl PropertyAllowList {
    /// Built-in properties plus per-rating ones, overlaid by the venue's
    /// `filter_properties`
    pub fn for_venue(venue: &VenueConfig) -> Self {
        let mut map: BTreeMap<String, String> = [
            ("number", "/number"),
            ("id", "/id"),
            ("title", "/title"),
            ("decision", "/decision"),
            ("replyCount", "/replyCount"),
            ("reviewsComplete", "/reviewsComplete"),
            ("reviewersAssigned", "/reviewProgress/numReviewersAssigned"),
            ("reviewsDone", "/reviewProgress/numReviewsDone"),
            ("confidence", "/reviewProgress/confidence/avg"),
            ("areaChairsAssigned", "/metaReviewProgress/numAreaChairsAssigned"),
            ("metaReviewsDone", "/metaReviewProgress/numMetaReviewsDone"),
            ("recommendation", "/metaReviews/*/recommendation"),
            ("reviewer", "/reviewers/*/memberId"),
            ("reviewerAnonymousId", "/reviewers/*/anonymousId"),
            ("areaChair", "/areaChairs/*/memberId"),
            ("seniorAreaChair", "/seniorAreaChairs/*/memberId"),
        ]
        .into_iter()
        .map(|(name, pointer)| (name.to_string(), pointer.to_string()))
        .collect();

        for rating in &venue.review_rating_names {
            let label = rating.label();
            let base = format!("/reviewProgress/ratings/{}", escape_pointer_token(label));
            map.insert(label.to_string(), format!("{}/avg", base));
            map.insert(format!("{}Avg", label), format!("{}/avg", base));
            map.insert(format!("{}Min", label), format!("{}/min", base));
            map.insert(format!("{}Max", label), format!("{}/max", base));
        }

        for (name, pointer) in &venue.filter_properties {
            map.insert(name.clone(), pointer.clone());
        }

        PropertyAllowList(map)
    }

    pub fn pointer(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    /// `==`
    Exact,
    /// `=`
    Contains,
}

impl Operator {
    /// Operator starting at the beginning of `s`, with its length
    fn at_start(s: &str) -> Option<(Operator, usize)> {
        const OPERATORS: [(&str, Operator); 7] = [
            ("!=", Operator::NotEqual),
            (">=", Operator::GreaterOrEqual),
            ("<=", Operator::LessOrEqual),
            ("==", Operator::Exact),
            (">", Operator::Greater),
            ("<", Operator::Less),
            ("=", Operator::Contains),
        ];
        OPERATORS
            .iter()
            .find(|(token, _)| s.starts_with(token))
            .map(|(token, op)| (*op, token.len()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub property: String,
    pub pointer: String,
    pub operator: Operator,
    pub value: String,
}

/// Disjunction of conjunctions
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub any_of: Vec<Vec<Clause>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RowFilter {
    #[default]
    All,
    Basic(String),
    Structured(Query),
}

impl RowFilter {
    /// Parse filter text; blank text matches everything
    pub fn parse(input: &str, properties: &PropertyAllowList) -> Result<Self, FilterError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(RowFilter::All);
        }
        match input.strip_prefix('+') {
            Some(query) => Ok(RowFilter::Structured(parse_query(query, properties)?)),
            None => Ok(RowFilter::Basic(input.to_string())),
        }
    }

    /// Whether `row` passes; `json` is the row serialized, needed only for
    /// structured queries
    pub fn matches(&self, row: &PaperRow, json: Option<&Value>) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Basic(term) => basic_match(row, term),
            RowFilter::Structured(query) => json.map_or(false, |json| query.matches(json)),
        }
    }

    /// Rows passing the filter, in input order
    pub fn apply<'r>(&self, rows: &'r [PaperRow]) -> Vec<&'r PaperRow> {
        match self {
            RowFilter::Structured(_) => rows
                .iter()
                .filter(|row| {
                    let json = serde_json::to_value(row).ok();
                    self.matches(row, json.as_ref())
                })
                .collect(),
            _ => rows.iter().filter(|row| self.matches(row, None)).collect(),
        }
    }
}

fn basic_match(row: &PaperRow, term: &str) -> bool {
    let term = term.trim();
    if let Ok(number) = term.parse::<u64>() {
        if row.number == number {
            return true;
        }
    }
    row.title.to_lowercase().contains(&term.to_lowercase())
}

/// Split `s` on ` keyword ` occurrences outside double quotes
fn split_outside_quotes<'s>(s: &'s str, keyword: &str) -> Vec<&'s str> {
    let separator = format!(" {} ", keyword);
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut i = 0;

    while i < s.len() {
        let rest = &s[i..];
        if rest.starts_with('"') {
            in_quotes = !in_quotes;
        } else if !in_quotes && rest.starts_with(separator.as_str()) {
            parts.push(&s[start..i]);
            i += separator.len();
            start = i;
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    parts.push(&s[start..]);
    parts
}

fn parse_query(text: &str, properties: &PropertyAllowList) -> Result<Query, FilterError> {
    let any_of = split_outside_quotes(text, "OR")
        .into_iter()
        .map(|group| {
            split_outside_quotes(group, "AND")
                .into_iter()
                .map(|clause| parse_clause(clause, properties))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Query { any_of })
}

fn parse_clause(text: &str, properties: &PropertyAllowList) -> Result<Clause, FilterError> {
    let text = text.trim();
    let (position, operator, len) = text
        .char_indices()
        .find_map(|(i, _)| Operator::at_start(&text[i..]).map(|(op, len)| (i, op, len)))
        .ok_or_else(|| FilterError::InvalidQuery(format!("no operator in '{}'", text)))?;

    let property = text[..position].trim();
    let raw_value = text[position + len..].trim();
    let value = raw_value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw_value);

    if property.is_empty() || value.is_empty() {
        return Err(FilterError::InvalidQuery(format!(
            "expected 'property operator value' in '{}'",
            text
        )));
    }

    let pointer = properties
        .pointer(property)
        .ok_or_else(|| FilterError::UnknownProperty(property.to_string()))?;

    Ok(Clause {
        property: property.to_string(),
        pointer: pointer.to_string(),
        operator,
        value: value.to_string(),
    })
}

impl Query {
    pub fn matches(&self, json: &Value) -> bool {
        self.any_of
            .iter()
            .any(|all_of| all_of.iter().all(|clause| clause.matches(json)))
    }
}

impl Clause {
    pub fn matches(&self, json: &Value) -> bool {
        let values = resolve_pointer(json, &self.pointer);
        match self.operator {
            Operator::NotEqual => !values
                .iter()
                .any(|v| value_matches(v, Operator::Exact, &self.value)),
            op => values.iter().any(|v| value_matches(v, op, &self.value)),
        }
    }
}

/// Values at a pointer; `*` fans out over arrays and objects, and a
/// resulting array contributes its elements
pub fn resolve_pointer<'v>(root: &'v Value, pointer: &str) -> Vec<&'v Value> {
    let mut current = vec![root];

    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        current = current
            .into_iter()
            .flat_map(|value| -> Vec<&'v Value> {
                match (value, token.as_str()) {
                    (Value::Array(items), "*") => items.iter().collect(),
                    (Value::Object(map), "*") => map.values().collect(),
                    (Value::Object(map), key) => map.get(key).into_iter().collect(),
                    (Value::Array(items), index) => index
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| items.get(i))
                        .into_iter()
                        .collect(),
                    _ => Vec::new(),
                }
            })
            .collect();
    }

    current
        .into_iter()
        .flat_map(|value| -> Vec<&'v Value> {
            match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            }
        })
        .collect()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Compare one resolved value against the clause value
///
/// Ordering operators need both sides numeric; a string value such as
/// `"N/A"` never satisfies them.
fn value_matches(value: &Value, operator: Operator, expected: &str) -> bool {
    let actual_number = value.as_f64();
    let expected_number = expected.parse::<f64>().ok();

    match operator {
        Operator::Greater | Operator::GreaterOrEqual | Operator::Less | Operator::LessOrEqual => {
            match (actual_number, expected_number) {
                (Some(a), Some(b)) => match operator {
                    Operator::Greater => a > b,
                    Operator::GreaterOrEqual => a >= b,
                    Operator::Less => a < b,
                    _ => a <= b,
                },
                _ => false,
            }
        }
        Operator::Exact | Operator::NotEqual => match (actual_number, expected_number) {
            (Some(a), Some(b)) => a == b,
            _ => as_text(value).map_or(false, |text| text == expected),
        },
        Operator::Contains => match (actual_number, expected_number) {
            (Some(a), Some(b)) => a == b,
            _ => as_text(value)
                .map_or(false, |text| text.to_lowercase().contains(&expected.to_lowercase())),
        },
    }
}
