//! Table export
//!
//! Exports an ordered column list over rows as `columns` + `rows` arrays,
//! the same shape the table API returns.

use crate::aggregator::{PaperRow, RatingStats, StatValue};
use crate::table::FilterError;
use orc_common::VenueConfig;
use serde::Serialize;
use serde_json::{json, Value};

type Extractor = Box<dyn Fn(&PaperRow) -> Value + Send + Sync>;

/// Named column with its value extractor
pub struct ExportColumn {
    pub header: String,
    extract: Extractor,
}

impl std::fmt::Debug for ExportColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportColumn")
            .field("header", &self.header)
            .finish()
    }
}

fn stat_json(value: StatValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn rating_column(label: &str, name: &str, pick: fn(&RatingStats) -> StatValue) -> ExportColumn {
    let key = label.to_string();
    ExportColumn::new(format!("{}_{}", label, name), move |row| {
        row.review_progress
            .ratings
            .get(&key)
            .map_or(Value::Null, |stats| stat_json(pick(stats)))
    })
}

fn member_ids<'r>(ids: impl Iterator<Item = &'r str>) -> Value {
    Value::String(ids.collect::<Vec<_>>().join("|"))
}

impl ExportColumn {
    pub fn new<F>(header: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&PaperRow) -> Value + Send + Sync + 'static,
    {
        Self {
            header: header.into(),
            extract: Box::new(extract),
        }
    }

    pub fn value(&self, row: &PaperRow) -> Value {
        (self.extract)(row)
    }

    /// Column by name
    ///
    /// Rating columns are `<label>_avg`, `<label>_min`, `<label>_max`.
    pub fn named(name: &str) -> Result<Self, FilterError> {
        let column = match name {
            "number" => Self::new(name, |row| json!(row.number)),
            "id" => Self::new(name, |row| json!(row.id)),
            "forum" => Self::new(name, |row| json!(row.forum)),
            "title" => Self::new(name, |row| json!(row.title)),
            "num_reviewers_assigned" => {
                Self::new(name, |row| json!(row.review_progress.num_reviewers_assigned))
            }
            "num_reviews_done" => Self::new(name, |row| json!(row.review_progress.num_reviews_done)),
            "reviews_complete" => Self::new(name, |row| json!(row.reviews_complete)),
            "confidence_avg" => Self::new(name, |row| stat_json(row.review_progress.confidence.avg)),
            "confidence_min" => Self::new(name, |row| stat_json(row.review_progress.confidence.min)),
            "confidence_max" => Self::new(name, |row| stat_json(row.review_progress.confidence.max)),
            "num_area_chairs_assigned" => Self::new(name, |row| {
                json!(row.meta_review_progress.num_area_chairs_assigned)
            }),
            "num_meta_reviews_done" => {
                Self::new(name, |row| json!(row.meta_review_progress.num_meta_reviews_done))
            }
            "decision" => Self::new(name, |row| json!(row.decision)),
            "reply_count" => Self::new(name, |row| json!(row.reply_count)),
            "reviewers" => Self::new(name, |row| {
                member_ids(row.reviewers.iter().map(|r| r.member.member_id.as_str()))
            }),
            "area_chairs" => Self::new(name, |row| {
                member_ids(row.area_chairs.iter().map(|r| r.member.member_id.as_str()))
            }),
            other => {
                if let Some(label) = other.strip_suffix("_avg") {
                    rating_column(label, "avg", |s| s.avg)
                } else if let Some(label) = other.strip_suffix("_min") {
                    rating_column(label, "min", |s| s.min)
                } else if let Some(label) = other.strip_suffix("_max") {
                    rating_column(label, "max", |s| s.max)
                } else {
                    return Err(FilterError::UnknownColumn(other.to_string()));
                }
            }
        };
        Ok(column)
    }

    /// Columns by name, in order
    pub fn parse_list(names: &str) -> Result<Vec<Self>, FilterError> {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Self::named)
            .collect()
    }

    /// Default export columns for a venue
    pub fn defaults(venue: &VenueConfig) -> Vec<Self> {
        let mut columns = vec![
            Self::new("number", |row| json!(row.number)),
            Self::new("id", |row| json!(row.id)),
            Self::new("title", |row| json!(row.title)),
            Self::new("num_reviewers_assigned", |row| {
                json!(row.review_progress.num_reviewers_assigned)
            }),
            Self::new("num_reviews_done", |row| json!(row.review_progress.num_reviews_done)),
        ];
        for rating in &venue.review_rating_names {
            let label = rating.label();
            columns.push(rating_column(label, "avg", |s| s.avg));
            columns.push(rating_column(label, "min", |s| s.min));
            columns.push(rating_column(label, "max", |s| s.max));
        }
        columns.push(Self::new("confidence_avg", |row| {
            stat_json(row.review_progress.confidence.avg)
        }));
        if venue.area_chairs.is_some() {
            columns.push(Self::new("num_meta_reviews_done", |row| {
                json!(row.meta_review_progress.num_meta_reviews_done)
            }));
        }
        columns.push(Self::new("decision", |row| json!(row.decision)));
        columns
    }
}

/// Exported table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    pub fn build<'r, I>(rows: I, columns: &[ExportColumn]) -> Self
    where
        I: IntoIterator<Item = &'r PaperRow>,
    {
        ExportTable {
            columns: columns.iter().map(|c| c.header.clone()).collect(),
            rows: rows
                .into_iter()
                .map(|row| columns.iter().map(|c| c.value(row)).collect())
                .collect(),
        }
    }

    /// Tab-separated text with a header line
    pub fn to_tsv(&self) -> String {
        let cell = |value: &Value| match value {
            Value::String(s) => s.replace(['\t', '\n'], " "),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        let mut out = self.columns.join("\t");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.iter().map(cell).collect::<Vec<_>>().join("\t"));
            out.push('\n');
        }
        out
    }
}
