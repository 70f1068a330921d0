//! Per-paper aggregation
//!
//! Turns joined papers into display rows: assignment status per member,
//! review counts, rating statistics, meta-review agreement, decision.
//!
//! Rating statistics are `"N/A"` when no review carries a parseable value.
//! Averages round half-up to two decimals.

use crate::identity::{AliasMap, ResolvedMember, RoleAssignments};
use crate::joiner::{Attribution, JoinedPaper, MetaReviewRecord, ReviewRecord, StageReply};
use orc_common::model::Reply;
use orc_common::{RoleKind, VenueConfig};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Shown when a paper has no decision reply
pub const NO_DECISION: &str = "No Decision";

/// Statistic that may be unavailable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Value(f64),
    NotAvailable,
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Value(v) => Some(*v),
            StatValue::NotAvailable => None,
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Value(v) => serializer.serialize_f64(*v),
            StatValue::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingStats {
    pub avg: StatValue,
    pub min: StatValue,
    pub max: StatValue,
}

impl RatingStats {
    pub const NOT_AVAILABLE: RatingStats = RatingStats {
        avg: StatValue::NotAvailable,
        min: StatValue::NotAvailable,
        max: StatValue::NotAvailable,
    };
}

/// Round half-up to `decimals` places
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}

/// Average, minimum and maximum of the present values
pub fn compute_stats<I>(values: I) -> RatingStats
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return RatingStats::NOT_AVAILABLE;
    }

    let sum: f64 = present.iter().sum();
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    RatingStats {
        avg: StatValue::Value(round_half_up(sum / present.len() as f64, 2)),
        min: StatValue::Value(min),
        max: StatValue::Value(max),
    }
}

/// Assigned member with submission status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatus {
    #[serde(flatten)]
    pub member: ResolvedMember,
    pub has_review: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewProgress {
    pub num_reviewers_assigned: usize,
    pub num_reviews_done: usize,
    /// Keyed by rating label
    pub ratings: BTreeMap<String, RatingStats>,
    pub confidence: RatingStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReviewProgress {
    pub num_area_chairs_assigned: usize,
    pub num_meta_reviews_done: usize,
}

/// One console table row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRow {
    pub number: u64,
    pub id: String,
    pub forum: String,
    pub title: String,
    pub reviewers: Vec<AssignmentStatus>,
    pub area_chairs: Vec<AssignmentStatus>,
    pub senior_area_chairs: Vec<ResolvedMember>,
    pub official_reviews: Vec<ReviewRecord>,
    pub meta_reviews: Vec<MetaReviewRecord>,
    pub review_progress: ReviewProgress,
    pub meta_review_progress: MetaReviewProgress,
    pub decision: String,
    /// Reply count per custom stage
    pub custom_stage_counts: BTreeMap<String, usize>,
    pub reply_count: usize,
    /// At least `review_threshold` reviews (default: all assigned) are in
    pub reviews_complete: bool,
}

impl PaperRow {
    /// Assigned reviewers without a submitted review
    pub fn missing_reviews(&self) -> usize {
        self.reviewers.iter().filter(|r| !r.has_review).count()
    }

    pub fn has_decision(&self) -> bool {
        self.decision != NO_DECISION
    }
}

pub struct Aggregator<'a> {
    venue: &'a VenueConfig,
    aliases: &'a AliasMap,
    assignments: &'a BTreeMap<RoleKind, RoleAssignments>,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        venue: &'a VenueConfig,
        aliases: &'a AliasMap,
        assignments: &'a BTreeMap<RoleKind, RoleAssignments>,
    ) -> Self {
        Self {
            venue,
            aliases,
            assignments,
        }
    }

    /// Rows ordered by paper number
    pub fn aggregate(&self, joined: Vec<JoinedPaper>) -> Vec<PaperRow> {
        let mut rows: Vec<PaperRow> = joined.into_iter().map(|paper| self.row(paper)).collect();
        rows.sort_by_key(|row| row.number);
        rows
    }

    fn members(&self, kind: RoleKind, number: u64) -> Vec<ResolvedMember> {
        self.assignments
            .get(&kind)
            .and_then(|role| role.paper(number))
            .map(|paper| paper.members.clone())
            .unwrap_or_default()
    }

    /// Whether a member has a reply among `attributions`
    ///
    /// Matches on anonymous group first, then on the real identity.
    fn has_review<'r, I>(&self, member: &ResolvedMember, attributions: I) -> bool
    where
        I: IntoIterator<Item = &'r Attribution>,
    {
        attributions.into_iter().any(|a| {
            let by_group = member.anon_group_id.is_some() && a.anon_group_id == member.anon_group_id;
            let by_member = a
                .member_id
                .as_deref()
                .map_or(false, |id| self.aliases.same_person(id, &member.member_id));
            by_group || by_member
        })
    }

    pub fn row(&self, joined: JoinedPaper) -> PaperRow {
        let JoinedPaper {
            paper,
            official_reviews,
            mut meta_reviews,
            decision,
            custom_stage_replies,
        } = joined;
        let number = paper.number;

        let reviewers: Vec<AssignmentStatus> = self
            .members(RoleKind::Reviewers, number)
            .into_iter()
            .map(|member| AssignmentStatus {
                has_review: self
                    .has_review(&member, official_reviews.iter().map(|r| &r.attribution)),
                member,
            })
            .collect();

        let area_chairs: Vec<AssignmentStatus> = self
            .members(RoleKind::AreaChairs, number)
            .into_iter()
            .map(|member| AssignmentStatus {
                has_review: self
                    .has_review(&member, meta_reviews.iter().map(|r| &r.attribution)),
                member,
            })
            .collect();

        let senior_area_chairs = self.members(RoleKind::SeniorAreaChairs, number);

        let ratings = self
            .venue
            .review_rating_names
            .iter()
            .map(|rating| {
                let label = rating.label();
                let stats = compute_stats(
                    official_reviews
                        .iter()
                        .map(|review| review.ratings.get(label).copied().flatten()),
                );
                (label.to_string(), stats)
            })
            .collect();
        let confidence = compute_stats(official_reviews.iter().map(|r| r.confidence));

        for meta in meta_reviews.iter_mut() {
            meta.agreement = self.find_agreement(&meta.id, &custom_stage_replies);
        }

        let review_progress = ReviewProgress {
            num_reviewers_assigned: reviewers.len(),
            num_reviews_done: official_reviews.len(),
            ratings,
            confidence,
        };
        let threshold = self
            .venue
            .review_threshold
            .unwrap_or(review_progress.num_reviewers_assigned);
        let reviews_complete =
            review_progress.num_reviewers_assigned > 0 && review_progress.num_reviews_done >= threshold;

        let decision = decision
            .as_ref()
            .and_then(|reply| reply.content.get_str("decision"))
            .unwrap_or(NO_DECISION)
            .to_string();

        PaperRow {
            number,
            id: paper.id.clone(),
            forum: paper.forum.clone(),
            title: paper.title().to_string(),
            meta_review_progress: MetaReviewProgress {
                num_area_chairs_assigned: area_chairs.len(),
                num_meta_reviews_done: meta_reviews.len(),
            },
            reviewers,
            area_chairs,
            senior_area_chairs,
            official_reviews,
            meta_reviews,
            review_progress,
            decision,
            custom_stage_counts: custom_stage_replies
                .iter()
                .map(|(stage, replies)| (stage.clone(), replies.len()))
                .collect(),
            reply_count: paper.replies.len(),
            reviews_complete,
        }
    }

    /// First custom-stage reply answering the meta-review, in stage order
    fn find_agreement(
        &self,
        meta_review_id: &str,
        custom_stage_replies: &BTreeMap<String, Vec<Reply>>,
    ) -> Option<StageReply> {
        self.venue.custom_stage_names.iter().find_map(|stage| {
            custom_stage_replies.get(stage)?.iter().find_map(|reply| {
                let answers = reply.replyto.as_deref() == Some(meta_review_id)
                    || reply.forum == meta_review_id;
                answers.then(|| StageReply {
                    id: reply.id.clone(),
                    stage: stage.clone(),
                    signature: reply.signature().map(str::to_string),
                })
            })
        })
    }
}
