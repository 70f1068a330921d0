//! In-memory API client
//!
//! Serves a fixed `ApiFixture` through the same `ApiClient` seam as the HTTP
//! client. Supports the query parameters the fetcher sends (`invitation`,
//! `prefix`, `id`, `groupBy`, `offset`, `limit`) and `POST /profiles/search`.

use super::client::{ApiClient, ApiError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Raw API collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFixture {
    #[serde(default)]
    pub notes: Vec<Value>,
    #[serde(default)]
    pub groups: Vec<Value>,
    #[serde(default)]
    pub invitations: Vec<Value>,
    #[serde(default)]
    pub profiles: Vec<Value>,
    /// `groupBy=tail` answers keyed by edge invitation id
    #[serde(default)]
    pub grouped_edges: BTreeMap<String, Vec<Value>>,
}

impl ApiFixture {
    /// Read a fixture from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Network(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// `ApiClient` answering from an `ApiFixture`
pub struct InMemoryApi {
    fixture: ApiFixture,
    failing_paths: BTreeSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryApi {
    pub fn new(fixture: ApiFixture) -> Self {
        Self {
            fixture,
            failing_paths: BTreeSet::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every request to `path` with a 500
    pub fn with_failure(mut self, path: impl Into<String>) -> Self {
        self.failing_paths.insert(path.into());
        self
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn before_request(&self, path: &str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_paths.contains(path) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("Injected failure for {}", path),
            });
        }
        Ok(())
    }
}

fn param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn str_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}

fn note_has_invitation(note: &Value, invitation: &str) -> bool {
    if str_field(note, "invitation") == Some(invitation) {
        return true;
    }
    note.get("invitations")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().any(|id| id.as_str() == Some(invitation)))
        .unwrap_or(false)
}

/// Slice `items` by `offset`/`limit` and wrap as `{key: [...], count}`
fn page(items: Vec<&Value>, key: &str, query: &[(String, String)]) -> Value {
    let count = items.len();
    let offset = param(query, "offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0usize);
    let limit = param(query, "limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(usize::MAX);

    let slice: Vec<Value> = items
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), Value::Array(slice));
    body.insert("count".to_string(), json!(count));
    Value::Object(body)
}

fn by_id_or_prefix<'a>(items: &'a [Value], query: &[(String, String)]) -> Vec<&'a Value> {
    let id = param(query, "id");
    let prefix = param(query, "prefix");
    items
        .iter()
        .filter(|item| {
            let item_id = str_field(item, "id").unwrap_or_default();
            id.map_or(true, |id| item_id == id)
                && prefix.map_or(true, |prefix| item_id.starts_with(prefix))
        })
        .collect()
}

fn string_list(body: &Value, key: &str) -> BTreeSet<String> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ApiClient for InMemoryApi {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        self.before_request(path).await?;

        match path {
            "/notes" => {
                let invitation = param(query, "invitation");
                let notes = self
                    .fixture
                    .notes
                    .iter()
                    .filter(|n| invitation.map_or(true, |inv| note_has_invitation(n, inv)))
                    .collect();
                Ok(page(notes, "notes", query))
            }
            "/groups" => Ok(page(
                by_id_or_prefix(&self.fixture.groups, query),
                "groups",
                query,
            )),
            "/invitations" => Ok(page(
                by_id_or_prefix(&self.fixture.invitations, query),
                "invitations",
                query,
            )),
            "/edges" => {
                let invitation = param(query, "invitation").unwrap_or_default();
                if param(query, "groupBy").is_some() {
                    let grouped = self
                        .fixture
                        .grouped_edges
                        .get(invitation)
                        .cloned()
                        .unwrap_or_default();
                    Ok(json!({ "groupedEdges": grouped }))
                } else {
                    Ok(json!({ "edges": [], "count": 0 }))
                }
            }
            _ => Err(ApiError::Status {
                status: 404,
                message: format!("Unknown path {}", path),
            }),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.before_request(path).await?;

        if path != "/profiles/search" {
            return Err(ApiError::Status {
                status: 404,
                message: format!("Unknown path {}", path),
            });
        }

        let ids = string_list(body, "ids");
        let emails = string_list(body, "emails");
        let profiles: Vec<Value> = self
            .fixture
            .profiles
            .iter()
            .filter(|profile| {
                let id_match = str_field(profile, "id").map_or(false, |id| ids.contains(id));
                let email_match = profile
                    .pointer("/content/emails")
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_str)
                            .any(|email| emails.contains(email))
                    })
                    .unwrap_or(false);
                id_match || email_match
            })
            .cloned()
            .collect();

        Ok(json!({ "profiles": profiles }))
    }
}
