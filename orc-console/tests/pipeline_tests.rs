//! Fetch + aggregation over the shared venue fixture

mod helpers;

use orc_common::model::{Group, Note, Paper, Profile};
use orc_common::{RoleConfig, RoleKind, VenueConfig};
use orc_console::aggregator::NO_DECISION;
use orc_console::fetcher::VenueSnapshot;
use orc_console::{build_console_data, StatValue};
use serde_json::json;

#[tokio::test]
async fn test_rows_exclude_withdrawn_and_follow_paper_number() {
    let (_, data) = helpers::console_data().await;

    let numbers: Vec<u64> = data.rows.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(data.rows[0].title, "Attention Everywhere");
}

#[tokio::test]
async fn test_two_reviews_give_average_min_max() {
    let (_, data) = helpers::console_data().await;
    let row = &data.rows[0];

    let rating = &row.review_progress.ratings["rating"];
    assert_eq!(rating.avg, StatValue::Value(7.0));
    assert_eq!(rating.min, StatValue::Value(6.0));
    assert_eq!(rating.max, StatValue::Value(8.0));
    assert_eq!(row.review_progress.confidence.avg, StatValue::Value(3.5));

    assert_eq!(row.review_progress.num_reviewers_assigned, 2);
    assert_eq!(row.review_progress.num_reviews_done, 2);
    assert!(row.reviews_complete);
    assert!(row.reviewers.iter().all(|r| r.has_review));
}

#[tokio::test]
async fn test_zero_reviews_report_not_available() {
    let (_, data) = helpers::console_data().await;
    let row = &data.rows[1];

    assert_eq!(row.review_progress.num_reviews_done, 0);
    let rating = &row.review_progress.ratings["rating"];
    assert_eq!(rating.avg, StatValue::NotAvailable);
    assert_eq!(rating.min, StatValue::NotAvailable);
    assert_eq!(rating.max, StatValue::NotAvailable);
    assert!(!row.reviews_complete);
    assert_eq!(row.decision, NO_DECISION);

    let json = serde_json::to_value(row).unwrap();
    assert_eq!(json["reviewProgress"]["ratings"]["rating"]["avg"], json!("N/A"));
}

#[tokio::test]
async fn test_min_le_avg_le_max_for_every_row() {
    let (_, data) = helpers::console_data().await;

    for row in &data.rows {
        for stats in row.review_progress.ratings.values() {
            if let (Some(min), Some(avg), Some(max)) =
                (stats.min.as_f64(), stats.avg.as_f64(), stats.max.as_f64())
            {
                assert!(min <= avg && avg <= max, "paper {}", row.number);
            }
        }
    }
}

#[tokio::test]
async fn test_paper_without_reviewers_is_never_complete() {
    let mut venue = helpers::venue();
    let snapshot = helpers::snapshot(&venue).await;

    for threshold in [None, Some(0), Some(1)] {
        venue.review_threshold = threshold;
        let data = build_console_data(&venue, &snapshot);
        let row = data.rows.iter().find(|r| r.number == 3).unwrap();
        assert_eq!(row.review_progress.num_reviewers_assigned, 0);
        assert!(!row.reviews_complete, "threshold {:?}", threshold);
    }
}

#[tokio::test]
async fn test_review_threshold_below_assigned_completes_early() {
    let mut venue = helpers::venue();
    venue.review_threshold = Some(1);
    let snapshot = helpers::snapshot(&venue).await;
    let data = build_console_data(&venue, &snapshot);

    assert!(data.rows[0].reviews_complete);
    assert!(!data.rows[1].reviews_complete);
}

#[tokio::test]
async fn test_aggregation_is_idempotent() {
    let venue = helpers::venue();
    let snapshot = helpers::snapshot(&venue).await;

    let first = serde_json::to_string(&build_console_data(&venue, &snapshot)).unwrap();
    let second = serde_json::to_string(&build_console_data(&venue, &snapshot)).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_meta_review_agreement_and_decision() {
    let (_, data) = helpers::console_data().await;
    let row = &data.rows[0];

    assert_eq!(row.meta_review_progress.num_area_chairs_assigned, 1);
    assert_eq!(row.meta_review_progress.num_meta_reviews_done, 1);
    let meta = &row.meta_reviews[0];
    assert_eq!(meta.recommendation.as_deref(), Some("Accept"));
    assert_eq!(meta.agreement.as_ref().map(|a| a.id.as_str()), Some("a1"));

    assert_eq!(row.decision, "Accept (Oral)");
    assert_eq!(row.custom_stage_counts["Meta_Review_Agreement"], 1);
    assert_eq!(row.reply_count, 5);
}

/// Area chair assignments come from the per-paper Area_Chairs groups, not
/// from another slot of the concurrent fetch
#[tokio::test]
async fn test_area_chair_assignments_come_from_area_chair_groups() {
    let (_, data) = helpers::console_data().await;

    let ac_ids: Vec<&str> = data.rows[0]
        .area_chairs
        .iter()
        .map(|s| s.member.member_id.as_str())
        .collect();
    assert_eq!(ac_ids, vec!["~Cat_Three1"]);
    assert_eq!(data.rows[0].area_chairs[0].member.anonymous_id.as_deref(), Some("ccc"));
    assert!(data.rows[0].area_chairs[0].has_review);

    assert!(data.rows[1].area_chairs.iter().all(|s| !s.has_review));
    assert!(data.rows[2].area_chairs.is_empty());
}

#[tokio::test]
async fn test_email_member_resolves_to_profile() {
    let (_, data) = helpers::console_data().await;

    let dan = data.rows[1]
        .reviewers
        .iter()
        .find(|s| s.member.member_id == "dan@example.org")
        .unwrap();
    assert_eq!(dan.member.anonymous_id.as_deref(), Some("eee"));
    assert_eq!(
        dan.member.profile.as_ref().map(|p| p.id.as_str()),
        Some("~Dan_Four1")
    );
}

#[tokio::test]
async fn test_reviewer_progress_and_summary() {
    let (_, data) = helpers::console_data().await;

    let reviewers = data.member_progress(RoleKind::Reviewers);
    let ids: Vec<&str> = reviewers.iter().map(|m| m.member_id.as_str()).collect();
    assert_eq!(ids, vec!["~Ann_One1", "~Bob_Two1", "~Dan_Four1", "~Eve_Five1"]);

    let ann = &reviewers[0];
    assert_eq!(ann.assigned_papers, vec![1, 2]);
    assert_eq!(ann.completed_papers, vec![1]);
    assert_eq!(ann.anonymous_ids[&2u64], "ddd");
    assert!(ann.bidding_complete);
    assert!(!ann.fully_complete);

    let bob = &reviewers[1];
    assert!(bob.fully_complete);
    assert!(!bob.bidding_complete);

    assert!(reviewers[3].assigned_papers.is_empty());
    assert!(!reviewers[3].fully_complete);

    let summary = &data.summary;
    assert_eq!(summary.paper_count, 3);
    assert_eq!(summary.reviews_assigned, 4);
    assert_eq!(summary.reviews_done, 2);
    assert_eq!(summary.papers_reviews_complete, 1);
    assert_eq!(summary.meta_reviews_assigned, 2);
    assert_eq!(summary.meta_reviews_done, 1);
    assert_eq!(summary.decisions_made, 1);
    assert_eq!(summary.decision_counts[NO_DECISION], 2);

    let role = &summary.roles[&RoleKind::Reviewers];
    assert_eq!(role.members, 4);
    assert_eq!(role.members_assigned, 3);
    assert_eq!(role.members_complete, 1);
    assert_eq!(role.members_done_bidding, 1);

    assert!(summary.features.bidding[&RoleKind::Reviewers]);
    assert!(summary.features.official_reviews);
    assert!(summary.features.meta_reviews);
    assert!(!summary.features.decisions);
}

#[test]
fn test_tilde_signature_maps_to_anonymous_reviewer() {
    let mut venue = VenueConfig::new("Venue", "Venue/-/Submission");
    venue.submission_name = "Paper".to_string();
    venue.reviewers = RoleConfig::new("Reviewers", "Reviewer_");

    let note: Note = serde_json::from_value(json!({
        "id": "p3",
        "number": 3,
        "content": {"title": {"value": "Third"}},
        "details": {"replies": [{
            "id": "r3",
            "forum": "p3",
            "replyto": "p3",
            "invitations": ["Venue/Paper3/-/Official_Review"],
            "signatures": ["~Jane_Doe1"],
            "content": {"rating": {"value": "7: Good paper"}}
        }]}
    }))
    .unwrap();
    let profile: Profile = serde_json::from_value(json!({
        "id": "~Jane_Doe1",
        "content": {"names": [{"fullname": "Jane Doe", "username": "~Jane_Doe1"}]}
    }))
    .unwrap();

    let snapshot = VenueSnapshot {
        papers: vec![Paper::from_note(&note, venue.api_version).unwrap()],
        paper_groups: vec![
            Group {
                id: "Venue/Paper3/Reviewers".into(),
                members: vec!["~Jane_Doe1".into()],
            },
            Group {
                id: "Venue/Paper3/Reviewer_xyz".into(),
                members: vec!["~Jane_Doe1".into()],
            },
        ],
        profiles: vec![profile],
        ..Default::default()
    };

    let data = build_console_data(&venue, &snapshot);
    let row = &data.rows[0];
    let jane = &row.reviewers[0];

    assert_eq!(jane.member.anonymous_id.as_deref(), Some("xyz"));
    assert!(jane.has_review);
    assert_eq!(row.official_reviews[0].attribution.anonymous_id.as_deref(), Some("xyz"));
    assert_eq!(
        row.review_progress.ratings["rating"].avg,
        StatValue::Value(7.0)
    );
}
