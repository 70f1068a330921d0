//! Aggregation phase
//!
//! Pure transformation of one fetched `VenueSnapshot` into console data, in
//! dependency order: aliases, role assignments, joined replies, rows,
//! member progress, summary. Running it twice over one snapshot yields
//! identical output.

use crate::aggregator::{Aggregator, PaperRow};
use crate::fetcher::VenueSnapshot;
use crate::identity::{AliasMap, IdentityResolver};
use crate::joiner::ReviewJoiner;
use crate::progress::{member_progress, summarize, FeatureFlags, MemberProgress, VenueSummary};
use orc_common::{RoleKind, VenueConfig};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the console displays for one venue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleData {
    pub rows: Vec<PaperRow>,
    pub progress: BTreeMap<RoleKind, Vec<MemberProgress>>,
    pub summary: VenueSummary,
}

impl ConsoleData {
    pub fn member_progress(&self, kind: RoleKind) -> &[MemberProgress] {
        self.progress.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn build_console_data(venue: &VenueConfig, snapshot: &VenueSnapshot) -> ConsoleData {
    let aliases = AliasMap::from_profiles(&snapshot.profiles);
    let assignments = IdentityResolver::new(venue, &aliases).resolve(&snapshot.paper_groups);

    let joiner = ReviewJoiner::new(venue, &aliases, &assignments);
    let joined = snapshot
        .papers
        .iter()
        .cloned()
        .map(|paper| joiner.join(paper))
        .collect();
    let rows = Aggregator::new(venue, &aliases, &assignments).aggregate(joined);

    let progress: BTreeMap<RoleKind, Vec<MemberProgress>> = venue
        .roles()
        .into_iter()
        .map(|(kind, _)| {
            let committee = snapshot
                .committees
                .get(&kind)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let members = member_progress(
                kind,
                &rows,
                committee,
                snapshot.bid_counts.get(&kind),
                venue.bid_threshold,
                &aliases,
            );
            (kind, members)
        })
        .collect();

    let features = FeatureFlags::from_invitations(venue, &snapshot.invitations);
    let summary = summarize(venue, &rows, &progress, features);

    tracing::debug!(
        rows = rows.len(),
        profiles = aliases.len(),
        "Aggregated console data"
    );

    ConsoleData {
        rows,
        progress,
        summary,
    }
}
