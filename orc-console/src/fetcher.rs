//! Resource fetcher
//!
//! Pulls everything the console needs for one venue in two phases:
//! - Phase 1 (concurrent): submissions with replies, per-paper groups,
//!   committee groups, venue invitations, bid counts per role
//! - Phase 2: profiles for every member discovered in phase 1, searched in
//!   concurrent chunks
//!
//! Any failing request fails the whole fetch; nothing partial is returned.

use crate::api::{get_all, take_array, ApiClient, ApiError};
use futures::future::try_join_all;
use orc_common::model::{Group, GroupedEdge, Invitation, Note, Paper, Profile};
use orc_common::{RoleKind, VenueConfig};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Identifiers per `POST /profiles/search` request
pub const PROFILE_CHUNK_SIZE: usize = 500;

/// Raw venue data for one load pass
#[derive(Debug, Clone, Default)]
pub struct VenueSnapshot {
    /// Active submissions ordered by number
    pub papers: Vec<Paper>,
    /// Per-paper groups (`<venue>/<submission_name><N>/...`)
    pub paper_groups: Vec<Group>,
    /// Venue-level committee group members per role
    pub committees: BTreeMap<RoleKind, Vec<String>>,
    pub invitations: Vec<Invitation>,
    /// Bid counts per role keyed by bidder id
    pub bid_counts: BTreeMap<RoleKind, BTreeMap<String, u64>>,
    pub profiles: Vec<Profile>,
}

pub struct ResourceFetcher<'a> {
    client: &'a dyn ApiClient,
    venue: &'a VenueConfig,
    page_limit: usize,
}

impl<'a> ResourceFetcher<'a> {
    pub fn new(client: &'a dyn ApiClient, venue: &'a VenueConfig, page_limit: usize) -> Self {
        Self {
            client,
            venue,
            page_limit,
        }
    }

    /// Run both phases
    pub async fn fetch(&self) -> Result<VenueSnapshot, ApiError> {
        let (papers, paper_groups, committees, invitations, bid_counts) = tokio::try_join!(
            self.fetch_papers(),
            self.fetch_paper_groups(),
            self.fetch_committees(),
            self.fetch_invitations(),
            self.fetch_bid_counts(),
        )?;

        let member_ids = profile_identifiers(&paper_groups, &committees);
        let profiles = self.fetch_profiles(&member_ids).await?;

        tracing::info!(
            venue_id = %self.venue.venue_id,
            papers = papers.len(),
            groups = paper_groups.len(),
            invitations = invitations.len(),
            profiles = profiles.len(),
            "Fetched venue data"
        );

        Ok(VenueSnapshot {
            papers,
            paper_groups,
            committees,
            invitations,
            bid_counts,
            profiles,
        })
    }

    /// Submissions with their replies, minus withdrawn and desk-rejected
    pub async fn fetch_papers(&self) -> Result<Vec<Paper>, ApiError> {
        let version = self.venue.api_version;
        let details = match version {
            orc_common::ApiVersion::V1 => "directReplies",
            orc_common::ApiVersion::V2 => "replies",
        };
        let params = vec![
            ("invitation".to_string(), self.venue.submission_id.clone()),
            ("details".to_string(), details.to_string()),
            ("domain".to_string(), self.venue.venue_id.clone()),
        ];

        let notes: Vec<Note> =
            get_all(self.client, "/notes", &params, "notes", self.page_limit).await?;
        let excluded = self.venue.excluded_venue_ids();

        let mut papers: Vec<Paper> = notes
            .iter()
            .filter_map(|note| Paper::from_note(note, version))
            .filter(|paper| {
                paper
                    .venue_id()
                    .map_or(true, |venue_id| !excluded.contains(&venue_id))
            })
            .collect();
        papers.sort_by_key(|paper| paper.number);

        tracing::debug!(
            fetched = notes.len(),
            active = papers.len(),
            "Fetched submissions"
        );
        Ok(papers)
    }

    /// Every per-paper group in one prefix query
    pub async fn fetch_paper_groups(&self) -> Result<Vec<Group>, ApiError> {
        let params = vec![
            ("prefix".to_string(), self.venue.paper_group_prefix()),
            ("select".to_string(), "id,members".to_string()),
            ("domain".to_string(), self.venue.venue_id.clone()),
        ];
        get_all(self.client, "/groups", &params, "groups", self.page_limit).await
    }

    /// Committee group members for each configured role
    pub async fn fetch_committees(&self) -> Result<BTreeMap<RoleKind, Vec<String>>, ApiError> {
        let requests = self.venue.roles().into_iter().filter_map(|(kind, _)| {
            let committee_id = self.venue.committee_id(kind)?;
            Some(async move {
                let params = vec![
                    ("id".to_string(), committee_id),
                    ("select".to_string(), "id,members".to_string()),
                ];
                let body = self.client.get("/groups", &params).await?;
                let groups: Vec<Group> = take_array(body, "groups")?;
                let members = groups
                    .into_iter()
                    .next()
                    .map(|group| group.members)
                    .unwrap_or_default();
                Ok::<_, ApiError>((kind, members))
            })
        });

        Ok(try_join_all(requests).await?.into_iter().collect())
    }

    /// Venue invitations, including expired ones
    pub async fn fetch_invitations(&self) -> Result<Vec<Invitation>, ApiError> {
        let params = vec![
            ("prefix".to_string(), format!("{}/", self.venue.venue_id)),
            ("expired".to_string(), "true".to_string()),
            ("domain".to_string(), self.venue.venue_id.clone()),
        ];
        get_all(
            self.client,
            "/invitations",
            &params,
            "invitations",
            self.page_limit,
        )
        .await
    }

    /// Bid counts grouped by bidder, for roles with a bid invitation
    pub async fn fetch_bid_counts(
        &self,
    ) -> Result<BTreeMap<RoleKind, BTreeMap<String, u64>>, ApiError> {
        let requests = self.venue.roles().into_iter().filter_map(|(kind, _)| {
            let invitation = self.venue.bid_invitation_id(kind)?;
            Some(async move {
                let params = vec![
                    ("invitation".to_string(), invitation),
                    ("groupBy".to_string(), "tail".to_string()),
                    ("select".to_string(), "count".to_string()),
                    ("domain".to_string(), self.venue.venue_id.clone()),
                ];
                let body = self.client.get("/edges", &params).await?;
                let grouped: Vec<GroupedEdge> = take_array(body, "groupedEdges")?;
                let counts: BTreeMap<String, u64> = grouped
                    .into_iter()
                    .filter_map(|edge| edge.id.tail.map(|tail| (tail, edge.count)))
                    .collect();
                Ok::<_, ApiError>((kind, counts))
            })
        });

        Ok(try_join_all(requests).await?.into_iter().collect())
    }

    /// Profiles for tilde-ids and emails, searched in concurrent chunks
    pub async fn fetch_profiles(&self, identifiers: &[String]) -> Result<Vec<Profile>, ApiError> {
        let (ids, emails): (Vec<&String>, Vec<&String>) =
            identifiers.iter().partition(|id| id.starts_with('~'));

        let id_chunks = ids.chunks(PROFILE_CHUNK_SIZE).map(|chunk| json!({ "ids": chunk }));
        let email_chunks = emails
            .chunks(PROFILE_CHUNK_SIZE)
            .map(|chunk| json!({ "emails": chunk }));

        let requests = id_chunks.chain(email_chunks).map(|body| async move {
            let response = self.client.post("/profiles/search", &body).await?;
            take_array::<Profile>(response, "profiles")
        });

        let mut seen = BTreeSet::new();
        let profiles: Vec<Profile> = try_join_all(requests)
            .await?
            .into_iter()
            .flatten()
            .filter(|profile| seen.insert(profile.id.clone()))
            .collect();
        Ok(profiles)
    }
}

/// Distinct tilde-ids and emails among group members
///
/// Members that are themselves group ids (anonymous groups) are skipped.
pub fn profile_identifiers(
    groups: &[Group],
    committees: &BTreeMap<RoleKind, Vec<String>>,
) -> Vec<String> {
    let members = groups
        .iter()
        .flat_map(|group| group.members.iter())
        .chain(committees.values().flatten());

    let distinct: BTreeSet<&String> = members
        .filter(|member| member.starts_with('~') || member.contains('@'))
        .collect();
    distinct.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiFixture, InMemoryApi};
    use orc_common::RoleConfig;

    fn venue() -> VenueConfig {
        let mut venue = VenueConfig::new("Conf", "Conf/-/Submission");
        venue.reviewers = RoleConfig::new("Reviewers", "Reviewer_").with_bid_name("Bid");
        venue.withdrawn_venue_id = Some("Conf/Withdrawn_Submission".to_string());
        venue
    }

    fn fixture() -> ApiFixture {
        ApiFixture {
            notes: vec![
                json!({"id": "p2", "number": 2, "invitations": ["Conf/-/Submission"],
                       "content": {"title": {"value": "Second"}, "venueid": {"value": "Conf/Submission"}}}),
                json!({"id": "p1", "number": 1, "invitations": ["Conf/-/Submission"],
                       "content": {"title": {"value": "First"}, "venueid": {"value": "Conf/Submission"}}}),
                json!({"id": "p3", "number": 3, "invitations": ["Conf/-/Submission"],
                       "content": {"title": {"value": "Gone"}, "venueid": {"value": "Conf/Withdrawn_Submission"}}}),
            ],
            groups: vec![
                json!({"id": "Conf/Submission1/Reviewers", "members": ["~Ann1", "bob@example.org"]}),
                json!({"id": "Conf/Submission1/Reviewer_x", "members": ["~Ann1"]}),
                json!({"id": "Conf/Reviewers", "members": ["~Ann1", "~Cy1"]}),
            ],
            profiles: vec![
                json!({"id": "~Ann1", "content": {"emails": ["ann@example.org"]}}),
                json!({"id": "~Bob1", "content": {"emails": ["bob@example.org"]}}),
            ],
            grouped_edges: [(
                "Conf/Reviewers/-/Bid".to_string(),
                vec![json!({"id": {"tail": "~Ann1"}, "count": 12})],
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_drops_withdrawn_and_orders_by_number() {
        let api = InMemoryApi::new(fixture());
        let venue = venue();
        let snapshot = ResourceFetcher::new(&api, &venue, 1000).fetch().await.unwrap();

        let numbers: Vec<u64> = snapshot.papers.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(snapshot.papers[0].title(), "First");
    }

    #[tokio::test]
    async fn test_fetch_collects_groups_bids_and_profiles() {
        let api = InMemoryApi::new(fixture());
        let venue = venue();
        let snapshot = ResourceFetcher::new(&api, &venue, 1000).fetch().await.unwrap();

        assert_eq!(snapshot.paper_groups.len(), 2);
        assert_eq!(
            snapshot.committees[&RoleKind::Reviewers],
            vec!["~Ann1".to_string(), "~Cy1".to_string()]
        );
        assert_eq!(snapshot.bid_counts[&RoleKind::Reviewers]["~Ann1"], 12);

        let mut profile_ids: Vec<&str> = snapshot.profiles.iter().map(|p| p.id.as_str()).collect();
        profile_ids.sort_unstable();
        assert_eq!(profile_ids, vec!["~Ann1", "~Bob1"]);
    }

    #[tokio::test]
    async fn test_any_failure_fails_the_fetch() {
        let api = InMemoryApi::new(fixture()).with_failure("/invitations");
        let venue = venue();
        let result = ResourceFetcher::new(&api, &venue, 1000).fetch().await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    }

    #[test]
    fn test_profile_identifiers_skip_group_ids() {
        let groups = vec![Group {
            id: "Conf/Submission1/Reviewers".into(),
            members: vec![
                "~Ann1".into(),
                "Conf/Submission1/Reviewer_x".into(),
                "bob@example.org".into(),
                "~Ann1".into(),
            ],
        }];
        let ids = profile_identifiers(&groups, &BTreeMap::new());
        assert_eq!(ids, vec!["bob@example.org".to_string(), "~Ann1".to_string()]);
    }
}
