//! HTTP client against a wiremock server

use orc_console::api::{get_all, query, ApiClient, ApiError, ApiOptions, HttpApiClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, token: Option<&str>) -> HttpApiClient {
    let options = ApiOptions {
        access_token: token.map(str::to_string),
        timeout: None,
    };
    HttpApiClient::new(server.uri(), options).unwrap()
}

#[tokio::test]
async fn test_get_all_follows_offset_paging() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .and(query_param("prefix", "Conf/Submission"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{"id": "g1", "members": []}, {"id": "g2", "members": []}],
            "count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{"id": "g3", "members": ["~A1"]}],
            "count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let groups: Vec<orc_common::model::Group> = get_all(
        &client,
        "/groups",
        &query([("prefix", "Conf/Submission")]),
        "groups",
        2,
    )
    .await
    .unwrap();

    let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g2", "g3"]);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invitations"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invitations": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Some("secret-token"));
    let body = client.get("/invitations", &[]).await.unwrap();
    assert_eq!(body, json!({"invitations": []}));
}

#[tokio::test]
async fn test_error_status_carries_api_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "name": "ForbiddenError",
            "message": "Forbidden"
        })))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client.get("/notes", &[]).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Forbidden");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_profile_search_posts_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/profiles/search"))
        .and(body_json(json!({"ids": ["~Ann_One1"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profiles": [{"id": "~Ann_One1", "content": {"emails": ["ann@example.org"]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let body = client
        .post("/profiles/search", &json!({"ids": ["~Ann_One1"]}))
        .await
        .unwrap();
    assert_eq!(body["profiles"][0]["id"], "~Ann_One1");
}

#[tokio::test]
async fn test_configured_timeout_is_enforced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"notes": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let options = ApiOptions {
        access_token: None,
        timeout: Some(Duration::from_millis(100)),
    };
    let client = HttpApiClient::new(server.uri(), options).unwrap();
    let err = client.get("/notes", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn test_unset_timeout_waits_for_slow_responses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"notes": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    assert_eq!(client.timeout(), None);
    let body = client.get("/notes", &[]).await.unwrap();
    assert_eq!(body, json!({"notes": []}));
}
