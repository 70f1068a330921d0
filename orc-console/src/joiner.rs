//! Review/decision joiner
//!
//! Classifies each paper's replies and attributes them to committee members:
//! - official reviews: invitation ends with `/-/<official_review_name>`
//! - meta-reviews: invitation ends with `/-/<meta_review_name>`
//! - decision: first reply whose invitation ends with `/-/<decision_name>`
//! - custom stages: invitation contains the stage name; one reply may land
//!   in several stage buckets
//!
//! Rating values are numbers, or legacy strings such as `"7: Good paper"`
//! whose leading integer is the value.

use crate::identity::{anonymous_suffix, AliasMap, RoleAssignments};
use once_cell::sync::Lazy;
use orc_common::model::{Paper, Reply};
use orc_common::{Content, RatingName, RoleKind, VenueConfig};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

static LEGACY_RATING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+): .*$").expect("rating pattern compiles"));

/// Numeric value of a rating field
pub fn parse_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEGACY_RATING
            .captures(s)?
            .get(1)?
            .as_str()
            .parse::<i64>()
            .ok()
            .map(|v| v as f64),
        _ => None,
    }
}

/// Value of the first candidate field holding one
///
/// A present but unparseable value yields `None`; later candidates are not
/// consulted.
pub fn extract_rating(content: &Content, rating: &RatingName) -> Option<f64> {
    let value = rating
        .fields()
        .into_iter()
        .find_map(|field| content.get(field))?;
    parse_rating(value)
}

/// Who a reply is attributed to
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub signature: Option<String>,
    pub anon_group_id: Option<String>,
    pub anonymous_id: Option<String>,
    /// Real member, canonicalized to a profile id when known
    pub member_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: String,
    #[serde(flatten)]
    pub attribution: Attribution,
    /// Keyed by rating label
    pub ratings: BTreeMap<String, Option<f64>>,
    pub confidence: Option<f64>,
    #[serde(skip)]
    pub content: Content,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReviewRecord {
    pub id: String,
    #[serde(flatten)]
    pub attribution: Attribution,
    pub recommendation: Option<String>,
    /// Custom-stage reply that responds to this meta-review
    pub agreement: Option<StageReply>,
    #[serde(skip)]
    pub content: Content,
}

/// Custom-stage reply linked to a meta-review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReply {
    pub id: String,
    pub stage: String,
    pub signature: Option<String>,
}

/// A paper with its replies classified and attributed
#[derive(Debug, Clone)]
pub struct JoinedPaper {
    pub paper: Paper,
    pub official_reviews: Vec<ReviewRecord>,
    pub meta_reviews: Vec<MetaReviewRecord>,
    pub decision: Option<Reply>,
    /// Stage name → replies of no other kind whose invitation contains it
    pub custom_stage_replies: BTreeMap<String, Vec<Reply>>,
}

pub struct ReviewJoiner<'a> {
    venue: &'a VenueConfig,
    aliases: &'a AliasMap,
    assignments: &'a BTreeMap<RoleKind, RoleAssignments>,
}

impl<'a> ReviewJoiner<'a> {
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

    pub fn join(&self, paper: Paper) -> JoinedPaper {
        let mut official_reviews = Vec::new();
        let mut meta_reviews = Vec::new();
        let mut decision: Option<Reply> = None;
        let mut custom_stage_replies: BTreeMap<String, Vec<Reply>> = self
            .venue
            .custom_stage_names
            .iter()
            .map(|stage| (stage.clone(), Vec::new()))
            .collect();

        for reply in &paper.replies {
            if reply.has_invitation_named(&self.venue.official_review_name) {
                official_reviews.push(self.review_record(paper.number, reply));
            } else if reply.has_invitation_named(&self.venue.meta_review_name) {
                meta_reviews.push(self.meta_review_record(paper.number, reply));
            } else if reply.has_invitation_named(&self.venue.decision_name) {
                if decision.is_none() {
                    decision = Some(reply.clone());
                }
            } else {
                // Substring match; one reply may land in several stages
                for stage in &self.venue.custom_stage_names {
                    if reply.has_invitation_containing(stage) {
                        if let Some(bucket) = custom_stage_replies.get_mut(stage) {
                            bucket.push(reply.clone());
                        }
                    }
                }
            }
        }

        JoinedPaper {
            paper,
            official_reviews,
            meta_reviews,
            decision,
            custom_stage_replies,
        }
    }

    fn review_record(&self, number: u64, reply: &Reply) -> ReviewRecord {
        let ratings = self
            .venue
            .review_rating_names
            .iter()
            .map(|rating| {
                (
                    rating.label().to_string(),
                    extract_rating(&reply.content, rating),
                )
            })
            .collect();
        let confidence = reply
            .content
            .get(&self.venue.review_confidence_name)
            .and_then(parse_rating);

        ReviewRecord {
            id: reply.id.clone(),
            attribution: self.attribute(RoleKind::Reviewers, number, reply),
            ratings,
            confidence,
            content: reply.content.clone(),
        }
    }

    fn meta_review_record(&self, number: u64, reply: &Reply) -> MetaReviewRecord {
        let recommendation = reply
            .content
            .get(&self.venue.meta_review_recommendation_name)
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        MetaReviewRecord {
            id: reply.id.clone(),
            attribution: self.attribute(RoleKind::AreaChairs, number, reply),
            recommendation,
            agreement: None,
            content: reply.content.clone(),
        }
    }

    /// Attribute a reply's signature to a member of `kind` on paper `number`
    ///
    /// Tilde-id signatures are mapped to the signer's anonymous group through
    /// aliases; anonymous-group signatures are used as-is and mapped back to
    /// the real member.
    pub fn attribute(&self, kind: RoleKind, number: u64, reply: &Reply) -> Attribution {
        let Some(signature) = reply.signature() else {
            return Attribution::default();
        };
        let role = self.assignments.get(&kind);
        let paper = role.and_then(|r| r.paper(number));

        let (anon_group_id, member_id) = if signature.starts_with('~') {
            (
                paper
                    .and_then(|p| p.anon_group_for(signature, self.aliases))
                    .map(str::to_string),
                Some(self.aliases.canonical(signature)),
            )
        } else {
            (
                Some(signature.to_string()),
                paper
                    .and_then(|p| p.member_for(signature))
                    .map(|real| self.aliases.canonical(real)),
            )
        };

        let anonymous_id = match (role, anon_group_id.as_deref()) {
            (Some(role), Some(group_id)) => anonymous_suffix(group_id, &role.anon_prefix),
            _ => None,
        };

        Attribution {
            signature: Some(signature.to_string()),
            anon_group_id,
            anonymous_id,
            member_id,
        }
    }
}
