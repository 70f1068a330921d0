//! Column sort
//!
//! Sorting is stable. Rows whose key is missing (`"N/A"` statistics) go last
//! in both directions.

use crate::aggregator::{PaperRow, RatingStats, StatValue};
use crate::table::FilterError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Sortable column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Number,
    Title,
    ReviewersAssigned,
    ReviewsDone,
    /// Assigned reviewers without a review
    MissingReviews,
    RatingAvg(String),
    RatingMin(String),
    RatingMax(String),
    ConfidenceAvg,
    MetaReviewsDone,
    Decision,
    ReplyCount,
}

/// Extracted sort key
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Text(String),
    Missing,
}

impl SortColumn {
    pub fn key(&self, row: &PaperRow) -> SortKey {
        let count = |n: usize| SortKey::Number(n as f64);
        let stat = |label: &str, pick: fn(&RatingStats) -> StatValue| {
            row.review_progress
                .ratings
                .get(label)
                .and_then(|stats| pick(stats).as_f64())
                .map_or(SortKey::Missing, SortKey::Number)
        };

        match self {
            SortColumn::Number => SortKey::Number(row.number as f64),
            SortColumn::Title => SortKey::Text(row.title.to_lowercase()),
            SortColumn::ReviewersAssigned => count(row.review_progress.num_reviewers_assigned),
            SortColumn::ReviewsDone => count(row.review_progress.num_reviews_done),
            SortColumn::MissingReviews => count(row.missing_reviews()),
            SortColumn::RatingAvg(label) => stat(label.as_str(), |s| s.avg),
            SortColumn::RatingMin(label) => stat(label.as_str(), |s| s.min),
            SortColumn::RatingMax(label) => stat(label.as_str(), |s| s.max),
            SortColumn::ConfidenceAvg => row
                .review_progress
                .confidence
                .avg
                .as_f64()
                .map_or(SortKey::Missing, SortKey::Number),
            SortColumn::MetaReviewsDone => count(row.meta_review_progress.num_meta_reviews_done),
            SortColumn::Decision => SortKey::Text(row.decision.to_lowercase()),
            SortColumn::ReplyCount => count(row.reply_count),
        }
    }
}

impl FromStr for SortColumn {
    type Err = FilterError;

    /// Parse `number`, `title`, `rating_avg:<label>` and the like;
    /// a rating column without a label uses `rating`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, label) = match s.split_once(':') {
            Some((name, label)) => (name, label.to_string()),
            None => (s, "rating".to_string()),
        };

        let column = match name {
            "number" => SortColumn::Number,
            "title" => SortColumn::Title,
            "reviewers_assigned" => SortColumn::ReviewersAssigned,
            "reviews_done" => SortColumn::ReviewsDone,
            "missing_reviews" => SortColumn::MissingReviews,
            "rating_avg" => SortColumn::RatingAvg(label),
            "rating_min" => SortColumn::RatingMin(label),
            "rating_max" => SortColumn::RatingMax(label),
            "confidence_avg" => SortColumn::ConfidenceAvg,
            "meta_reviews_done" => SortColumn::MetaReviewsDone,
            "decision" => SortColumn::Decision,
            "reply_count" => SortColumn::ReplyCount,
            other => return Err(FilterError::UnknownColumn(other.to_string())),
        };
        Ok(column)
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortColumn::Number => f.write_str("number"),
            SortColumn::Title => f.write_str("title"),
            SortColumn::ReviewersAssigned => f.write_str("reviewers_assigned"),
            SortColumn::ReviewsDone => f.write_str("reviews_done"),
            SortColumn::MissingReviews => f.write_str("missing_reviews"),
            SortColumn::RatingAvg(label) => write!(f, "rating_avg:{}", label),
            SortColumn::RatingMin(label) => write!(f, "rating_min:{}", label),
            SortColumn::RatingMax(label) => write!(f, "rating_max:{}", label),
            SortColumn::ConfidenceAvg => f.write_str("confidence_avg"),
            SortColumn::MetaReviewsDone => f.write_str("meta_reviews_done"),
            SortColumn::Decision => f.write_str("decision"),
            SortColumn::ReplyCount => f.write_str("reply_count"),
        }
    }
}

/// Order two keys; `Missing` is greater than everything regardless of direction
pub fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, _) => Ordering::Greater,
        (_, SortKey::Missing) => Ordering::Less,
        (SortKey::Number(x), SortKey::Number(y)) => {
            direction.apply(x.partial_cmp(y).unwrap_or(Ordering::Equal))
        }
        (SortKey::Text(x), SortKey::Text(y)) => direction.apply(x.cmp(y)),
        (SortKey::Number(_), SortKey::Text(_)) => direction.apply(Ordering::Less),
        (SortKey::Text(_), SortKey::Number(_)) => direction.apply(Ordering::Greater),
    }
}

/// Stable sort of row references by `column`
pub fn sort_rows(rows: &mut Vec<&PaperRow>, column: &SortColumn, direction: SortDirection) {
    let mut keyed: Vec<(SortKey, &PaperRow)> =
        rows.drain(..).map(|row| (column.key(row), row)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, direction));
    rows.extend(keyed.into_iter().map(|(_, row)| row));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_columns() {
        assert_eq!("number".parse::<SortColumn>().unwrap(), SortColumn::Number);
        assert_eq!(
            "rating_avg".parse::<SortColumn>().unwrap(),
            SortColumn::RatingAvg("rating".to_string())
        );
        assert_eq!(
            "rating_max:soundness".parse::<SortColumn>().unwrap(),
            SortColumn::RatingMax("soundness".to_string())
        );
        assert!("bogus".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_display_round_trips_parse() {
        let column = SortColumn::RatingMin("soundness".to_string());
        assert_eq!(column.to_string().parse::<SortColumn>().unwrap(), column);
    }

    #[test]
    fn test_missing_sorts_last_both_directions() {
        let keys = [SortKey::Missing, SortKey::Number(2.0), SortKey::Number(5.0)];

        let mut asc = keys.to_vec();
        asc.sort_by(|a, b| compare_keys(a, b, SortDirection::Asc));
        assert_eq!(asc, vec![SortKey::Number(2.0), SortKey::Number(5.0), SortKey::Missing]);

        let mut desc = keys.to_vec();
        desc.sort_by(|a, b| compare_keys(a, b, SortDirection::Desc));
        assert_eq!(desc, vec![SortKey::Number(5.0), SortKey::Number(2.0), SortKey::Missing]);
    }

    #[test]
    fn test_text_keys_compare_lowercased() {
        assert_eq!(
            compare_keys(
                &SortKey::Text("alpha".into()),
                &SortKey::Text("beta".into()),
                SortDirection::Desc
            ),
            Ordering::Greater
        );
    }
}
