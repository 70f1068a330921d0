//! Shared venue fixture for integration tests
//!
//! `Conf/2025` with three papers:
//! - Paper 1: two reviews (6 and 8), one meta-review with an agreement, a decision
//! - Paper 2: two assigned reviewers, no reviews
//! - Paper 3: no reviewers assigned

#![allow(dead_code)]

use orc_common::{RoleConfig, VenueConfig};
use orc_console::api::{ApiFixture, InMemoryApi};
use orc_console::{build_console_data, ConsoleData, ResourceFetcher, VenueSnapshot};
use serde_json::{json, Value};

pub const VENUE_ID: &str = "Conf/2025";

pub fn venue() -> VenueConfig {
    let mut venue = VenueConfig::new(VENUE_ID, "Conf/2025/-/Submission");
    venue.reviewers = RoleConfig::new("Reviewers", "Reviewer_").with_bid_name("Bid");
    venue.area_chairs = Some(RoleConfig::new("Area_Chairs", "Area_Chair_"));
    venue.custom_stage_names = vec!["Meta_Review_Agreement".to_string()];
    venue.bid_threshold = 40;
    venue.withdrawn_venue_id = Some("Conf/2025/Withdrawn_Submission".to_string());
    venue
}

fn paper(number: u64, title: &str, replies: Vec<Value>) -> Value {
    json!({
        "id": format!("p{}", number),
        "number": number,
        "forum": format!("p{}", number),
        "invitations": ["Conf/2025/-/Submission"],
        "content": {
            "title": {"value": title},
            "venueid": {"value": "Conf/2025/Submission"}
        },
        "details": {"replies": replies}
    })
}

fn reply(id: &str, number: u64, stage: &str, signature: &str, content: Value) -> Value {
    json!({
        "id": id,
        "forum": format!("p{}", number),
        "replyto": format!("p{}", number),
        "invitations": [format!("Conf/2025/Submission{}/-/{}", number, stage)],
        "signatures": [signature],
        "content": content
    })
}

fn group(id: &str, members: &[&str]) -> Value {
    json!({"id": id, "members": members})
}

fn profile(id: &str, name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "content": {
            "names": [{"fullname": name, "username": id, "preferred": true}],
            "emails": [email],
            "preferredEmail": email
        }
    })
}

pub fn fixture() -> ApiFixture {
    let paper1_replies = vec![
        reply(
            "r1",
            1,
            "Official_Review",
            "Conf/2025/Submission1/Reviewer_aaa",
            json!({"rating": {"value": "6: Marginally above threshold"},
                   "confidence": {"value": "4: Confident"}}),
        ),
        reply(
            "r2",
            1,
            "Official_Review",
            "Conf/2025/Submission1/Reviewer_bbb",
            json!({"rating": {"value": "8: Accept"},
                   "confidence": {"value": "3: Fairly confident"}}),
        ),
        reply(
            "m1",
            1,
            "Meta_Review",
            "Conf/2025/Submission1/Area_Chair_ccc",
            json!({"recommendation": {"value": "Accept"}}),
        ),
        json!({
            "id": "a1",
            "forum": "p1",
            "replyto": "m1",
            "invitations": ["Conf/2025/Submission1/-/Meta_Review_Agreement"],
            "signatures": ["Conf/2025/Program_Chairs"],
            "content": {"agree": {"value": "Yes"}}
        }),
        reply(
            "d1",
            1,
            "Decision",
            "Conf/2025/Program_Chairs",
            json!({"decision": {"value": "Accept (Oral)"}}),
        ),
    ];

    let mut withdrawn = paper(4, "Withdrawn paper", vec![]);
    withdrawn["content"]["venueid"] = json!({"value": "Conf/2025/Withdrawn_Submission"});

    ApiFixture {
        notes: vec![
            paper(2, "Graph Methods", vec![]),
            paper(1, "Attention Everywhere", paper1_replies),
            paper(3, "Unassigned Work", vec![]),
            withdrawn,
        ],
        groups: vec![
            group("Conf/2025/Submission1/Reviewers", &["~Ann_One1", "~Bob_Two1"]),
            group("Conf/2025/Submission1/Reviewer_aaa", &["~Ann_One1"]),
            group("Conf/2025/Submission1/Reviewer_bbb", &["~Bob_Two1"]),
            group("Conf/2025/Submission1/Area_Chairs", &["~Cat_Three1"]),
            group("Conf/2025/Submission1/Area_Chair_ccc", &["~Cat_Three1"]),
            group("Conf/2025/Submission2/Reviewers", &["~Ann_One1", "dan@example.org"]),
            group("Conf/2025/Submission2/Reviewer_ddd", &["~Ann_One1"]),
            group("Conf/2025/Submission2/Reviewer_eee", &["dan@example.org"]),
            group("Conf/2025/Submission2/Area_Chairs", &["~Cat_Three1"]),
            group("Conf/2025/Submission2/Area_Chair_fff", &["~Cat_Three1"]),
            group(
                "Conf/2025/Reviewers",
                &["~Ann_One1", "~Bob_Two1", "dan@example.org", "~Eve_Five1"],
            ),
            group("Conf/2025/Area_Chairs", &["~Cat_Three1"]),
        ],
        invitations: vec![
            json!({"id": "Conf/2025/-/Submission"}),
            json!({"id": "Conf/2025/Reviewers/-/Bid"}),
            json!({"id": "Conf/2025/Submission1/-/Official_Review"}),
            json!({"id": "Conf/2025/Submission1/-/Meta_Review"}),
        ],
        profiles: vec![
            profile("~Ann_One1", "Ann One", "ann@example.org"),
            profile("~Bob_Two1", "Bob Two", "bob@example.org"),
            profile("~Cat_Three1", "Cat Three", "cat@example.org"),
            profile("~Dan_Four1", "Dan Four", "dan@example.org"),
            profile("~Eve_Five1", "Eve Five", "eve@example.org"),
        ],
        grouped_edges: [(
            "Conf/2025/Reviewers/-/Bid".to_string(),
            vec![
                json!({"id": {"tail": "~Ann_One1"}, "count": 55}),
                json!({"id": {"tail": "~Bob_Two1"}, "count": 12}),
            ],
        )]
        .into_iter()
        .collect(),
    }
}

pub async fn snapshot(venue: &VenueConfig) -> VenueSnapshot {
    let api = InMemoryApi::new(fixture());
    ResourceFetcher::new(&api, venue, 2)
        .fetch()
        .await
        .expect("fixture fetch succeeds")
}

pub async fn console_data() -> (VenueConfig, ConsoleData) {
    let venue = venue();
    let snapshot = snapshot(&venue).await;
    let data = build_console_data(&venue, &snapshot);
    (venue, data)
}
