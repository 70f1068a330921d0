//! API client trait and paging helper

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Page size used by `get_all` unless configured otherwise
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Query parameters, names taken verbatim from the API documentation
pub type QueryParams = Vec<(String, String)>;

/// API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response is missing '{0}'")]
    MissingKey(String),
}

/// Minimal REST surface the console consumes
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET path?query`, returning the JSON body
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError>;

    /// `POST path` with a JSON body, returning the JSON body
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

/// Build query parameters from string pairs
pub fn query<const N: usize>(pairs: [(&str, &str); N]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Deserialize the array stored under `key` in a response body
pub fn take_array<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let items = match body {
        Value::Object(mut map) => map.remove(key),
        _ => None,
    };

    match items {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| ApiError::Parse(e.to_string())))
            .collect(),
        _ => Err(ApiError::MissingKey(key.to_string())),
    }
}

/// Fetch every page of a collection
///
/// Pages with `offset`/`limit` until the reported `count` is reached or a
/// short page comes back.
pub async fn get_all<T, C>(
    client: &C,
    path: &str,
    params: &[(String, String)],
    key: &str,
    limit: usize,
) -> Result<Vec<T>, ApiError>
where
    T: DeserializeOwned,
    C: ApiClient + ?Sized,
{
    let limit = limit.max(1);
    let mut results = Vec::new();
    let mut offset = 0usize;

    loop {
        let mut page_params = params.to_vec();
        page_params.push(("limit".to_string(), limit.to_string()));
        page_params.push(("offset".to_string(), offset.to_string()));

        let body = client.get(path, &page_params).await?;
        let total = body.get("count").and_then(Value::as_u64).map(|c| c as usize);
        let page: Vec<T> = take_array(body, key)?;
        let page_len = page.len();
        results.extend(page);
        offset += page_len;

        tracing::debug!(path = %path, offset, page_len, total = ?total, "Fetched page");

        let reached_total = total.map(|t| offset >= t).unwrap_or(false);
        if page_len < limit || reached_total {
            break;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_array_reads_key() {
        let ids: Vec<String> = take_array(json!({"ids": ["a", "b"]}), "ids").unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_take_array_missing_key() {
        let result: Result<Vec<String>, _> = take_array(json!({"other": []}), "ids");
        assert!(matches!(result, Err(ApiError::MissingKey(k)) if k == "ids"));
    }

    #[test]
    fn test_take_array_bad_item() {
        let result: Result<Vec<u64>, _> = take_array(json!({"ids": ["x"]}), "ids");
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_query_builder() {
        let q = query([("invitation", "Conf/-/Submission"), ("details", "replies")]);
        assert_eq!(q[0], ("invitation".to_string(), "Conf/-/Submission".to_string()));
        assert_eq!(q.len(), 2);
    }
}
