//! Note content normalization
//!
//! The API serves note content in two shapes depending on its version:
//! - **v1**: flat fields (`"title": "A paper"`)
//! - **v2**: value-wrapped fields (`"title": {"value": "A paper"}`)
//!
//! Every note is normalized into a single [`Content`] map when it leaves the
//! fetch layer, so no aggregation code ever branches on the API version.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// API version a venue is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ApiVersion {
    /// Legacy API with flat content fields
    V1,
    /// Current API with `{value}`-wrapped content fields
    #[default]
    V2,
}

impl TryFrom<u8> for ApiVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ApiVersion::V1),
            2 => Ok(ApiVersion::V2),
            other => Err(format!("unsupported API version: {}", other)),
        }
    }
}

impl From<ApiVersion> for u8 {
    fn from(version: ApiVersion) -> Self {
        match version {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}

/// Normalized note content: field name → plain value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(BTreeMap<String, Value>);

impl Content {
    /// Normalize raw API content for the given version
    ///
    /// v2 fields without a `value` key (e.g. a field hidden from the caller,
    /// which only carries `readers`) are treated as absent.
    pub fn normalize(raw: &Map<String, Value>, version: ApiVersion) -> Self {
        let fields = raw
            .iter()
            .filter_map(|(name, value)| {
                let plain = match version {
                    ApiVersion::V1 => value.clone(),
                    ApiVersion::V2 => match value {
                        Value::Object(wrapper) => wrapper.get("value")?.clone(),
                        other => other.clone(),
                    },
                };
                Some((name.clone(), plain))
            })
            .collect();

        Content(fields)
    }

    /// Field value, `None` when the field is absent or `null`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Field value as a string slice
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Content {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Content(iter.into_iter().collect())
    }
}
