//! Per-member progress and venue summary
//!
//! Member progress is keyed by the member's profile id when known, so one
//! person listed under an email on one paper and a tilde-id on another is
//! counted once.

use crate::aggregator::PaperRow;
use crate::identity::{AliasMap, ProfileSummary};
use orc_common::model::Invitation;
use orc_common::{RoleKind, VenueConfig};
use serde::Serialize;
use std::collections::BTreeMap;

/// Progress of one committee member
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub member_id: String,
    pub profile: Option<ProfileSummary>,
    /// Paper number → anonymous id on that paper
    pub anonymous_ids: BTreeMap<u64, String>,
    pub assigned_papers: Vec<u64>,
    pub completed_papers: Vec<u64>,
    pub bid_count: u64,
    pub bidding_complete: bool,
    /// Every assigned paper has this member's reply; false with no assignments
    pub fully_complete: bool,
}

impl MemberProgress {
    fn new(member_id: String, aliases: &AliasMap) -> Self {
        Self {
            profile: aliases.summary(&member_id).cloned(),
            member_id,
            anonymous_ids: BTreeMap::new(),
            assigned_papers: Vec::new(),
            completed_papers: Vec::new(),
            bid_count: 0,
            bidding_complete: false,
            fully_complete: false,
        }
    }
}

/// Progress for every member of a role
///
/// Includes committee members without assignments. Reviewers complete by
/// official review, area chairs by meta-review; senior area chairs have no
/// completion stage.
pub fn member_progress(
    kind: RoleKind,
    rows: &[PaperRow],
    committee: &[String],
    bid_counts: Option<&BTreeMap<String, u64>>,
    bid_threshold: u64,
    aliases: &AliasMap,
) -> Vec<MemberProgress> {
    let mut progress: BTreeMap<String, MemberProgress> = BTreeMap::new();

    for member in committee {
        let key = aliases.canonical(member);
        progress
            .entry(key.clone())
            .or_insert_with(|| MemberProgress::new(key, aliases));
    }

    for row in rows {
        // (member id, anonymous id, completed)
        let assigned: Vec<(&str, Option<&str>, bool)> = match kind {
            RoleKind::Reviewers => row
                .reviewers
                .iter()
                .map(|s| (s.member.member_id.as_str(), s.member.anonymous_id.as_deref(), s.has_review))
                .collect(),
            RoleKind::AreaChairs => row
                .area_chairs
                .iter()
                .map(|s| (s.member.member_id.as_str(), s.member.anonymous_id.as_deref(), s.has_review))
                .collect(),
            RoleKind::SeniorAreaChairs => row
                .senior_area_chairs
                .iter()
                .map(|m| (m.member_id.as_str(), m.anonymous_id.as_deref(), false))
                .collect(),
        };

        for (member_id, anonymous_id, completed) in assigned {
            let key = aliases.canonical(member_id);
            let entry = progress
                .entry(key.clone())
                .or_insert_with(|| MemberProgress::new(key, aliases));
            entry.assigned_papers.push(row.number);
            if let Some(anonymous_id) = anonymous_id {
                entry.anonymous_ids.insert(row.number, anonymous_id.to_string());
            }
            if completed {
                entry.completed_papers.push(row.number);
            }
        }
    }

    let mut bids: BTreeMap<String, u64> = BTreeMap::new();
    for (tail, count) in bid_counts.into_iter().flatten() {
        *bids.entry(aliases.canonical(tail)).or_default() += count;
    }

    progress
        .into_values()
        .map(|mut member| {
            member.bid_count = bids.get(&member.member_id).copied().unwrap_or(0);
            member.bidding_complete = member.bid_count >= bid_threshold;
            member.fully_complete = kind != RoleKind::SeniorAreaChairs
                && !member.assigned_papers.is_empty()
                && member.completed_papers.len() == member.assigned_papers.len();
            member
        })
        .collect()
}

/// Stages the venue has opened, detected from its invitations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    /// Roles with a bid invitation present
    pub bidding: BTreeMap<RoleKind, bool>,
    pub official_reviews: bool,
    pub meta_reviews: bool,
    pub decisions: bool,
    pub custom_stages: BTreeMap<String, bool>,
}

impl FeatureFlags {
    pub fn from_invitations(venue: &VenueConfig, invitations: &[Invitation]) -> Self {
        let named = |name: &str| {
            let suffix = format!("/-/{}", name);
            invitations.iter().any(|inv| inv.id.ends_with(&suffix))
        };

        let bidding = venue
            .roles()
            .into_iter()
            .map(|(kind, _)| {
                let present = venue
                    .bid_invitation_id(kind)
                    .map_or(false, |id| invitations.iter().any(|inv| inv.id == id));
                (kind, present)
            })
            .collect();

        FeatureFlags {
            bidding,
            official_reviews: named(&venue.official_review_name),
            meta_reviews: venue.area_chairs.is_some() && named(&venue.meta_review_name),
            decisions: named(&venue.decision_name),
            custom_stages: venue
                .custom_stage_names
                .iter()
                .map(|stage| {
                    (
                        stage.clone(),
                        invitations.iter().any(|inv| inv.id.contains(stage.as_str())),
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub members: usize,
    pub members_assigned: usize,
    pub members_complete: usize,
    pub members_done_bidding: usize,
}

/// Venue-wide counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSummary {
    pub venue_id: String,
    pub paper_count: usize,
    pub reviews_assigned: usize,
    pub reviews_done: usize,
    pub papers_reviews_complete: usize,
    pub meta_reviews_assigned: usize,
    pub meta_reviews_done: usize,
    pub decisions_made: usize,
    /// Decision label → paper count, `No Decision` included
    pub decision_counts: BTreeMap<String, usize>,
    pub roles: BTreeMap<RoleKind, RoleSummary>,
    pub features: FeatureFlags,
}

pub fn summarize(
    venue: &VenueConfig,
    rows: &[PaperRow],
    progress: &BTreeMap<RoleKind, Vec<MemberProgress>>,
    features: FeatureFlags,
) -> VenueSummary {
    let mut decision_counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        *decision_counts.entry(row.decision.clone()).or_default() += 1;
    }

    let roles = progress
        .iter()
        .map(|(kind, members)| {
            let summary = RoleSummary {
                members: members.len(),
                members_assigned: members.iter().filter(|m| !m.assigned_papers.is_empty()).count(),
                members_complete: members.iter().filter(|m| m.fully_complete).count(),
                members_done_bidding: members.iter().filter(|m| m.bidding_complete).count(),
            };
            (*kind, summary)
        })
        .collect();

    VenueSummary {
        venue_id: venue.venue_id.clone(),
        paper_count: rows.len(),
        reviews_assigned: rows.iter().map(|r| r.review_progress.num_reviewers_assigned).sum(),
        reviews_done: rows.iter().map(|r| r.review_progress.num_reviews_done).sum(),
        papers_reviews_complete: rows.iter().filter(|r| r.reviews_complete).count(),
        meta_reviews_assigned: rows
            .iter()
            .filter(|r| r.meta_review_progress.num_area_chairs_assigned > 0)
            .count(),
        meta_reviews_done: rows.iter().map(|r| r.meta_review_progress.num_meta_reviews_done).sum(),
        decisions_made: rows.iter().filter(|r| r.has_decision()).count(),
        decision_counts,
        roles,
        features,
    }
}
