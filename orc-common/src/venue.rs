//! Venue and committee-role configuration
//!
//! One `VenueConfig` parameterizes the whole console pipeline. Each committee
//! role (reviewers, area chairs, senior area chairs) is described by a
//! `RoleConfig` record instead of a role-specific code path.

use crate::content::ApiVersion;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Committee role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Reviewers,
    AreaChairs,
    SeniorAreaChairs,
}

impl RoleKind {
    pub const ALL: [RoleKind; 3] = [
        RoleKind::Reviewers,
        RoleKind::AreaChairs,
        RoleKind::SeniorAreaChairs,
    ];

    /// Whether assignment lists for this role drop members that are neither
    /// a tilde-id nor a valid email
    ///
    /// Reviewer lists keep every member. The asymmetry is deliberate until
    /// product owners decide otherwise.
    pub fn requires_valid_member_id(self) -> bool {
        !matches!(self, RoleKind::Reviewers)
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleKind::Reviewers => "reviewers",
            RoleKind::AreaChairs => "area_chairs",
            RoleKind::SeniorAreaChairs => "senior_area_chairs",
        };
        f.write_str(name)
    }
}

/// Per-role group naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Per-paper group name, e.g. `Reviewers`
    pub name: String,
    /// Anonymous subgroup prefix, e.g. `Reviewer_`
    pub anon_prefix: String,
    /// Venue-level committee group; defaults to `<venue_id>/<name>`
    #[serde(default)]
    pub committee_id: Option<String>,
    /// Bid invitation name, e.g. `Bid`; no bid counts when unset
    #[serde(default)]
    pub bid_name: Option<String>,
}

impl RoleConfig {
    pub fn new(name: impl Into<String>, anon_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anon_prefix: anon_prefix.into(),
            committee_id: None,
            bid_name: None,
        }
    }

    pub fn with_bid_name(mut self, bid_name: impl Into<String>) -> Self {
        self.bid_name = Some(bid_name.into());
        self
    }
}

/// Review rating field specification
///
/// Either a single content field (`"rating"`) or a labelled list of
/// candidate fields (`{ overall = ["rating", "final_rating"] }`) of which the
/// first one holding a value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingName {
    Field(String),
    Candidates(BTreeMap<String, Vec<String>>),
}

impl RatingName {
    /// Label the statistics for this rating are keyed by
    pub fn label(&self) -> &str {
        match self {
            RatingName::Field(field) => field,
            RatingName::Candidates(map) => map.keys().next().map(String::as_str).unwrap_or(""),
        }
    }

    /// Candidate content fields, in priority order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            RatingName::Field(field) => vec![field.as_str()],
            RatingName::Candidates(map) => map
                .values()
                .next()
                .map(|fields| fields.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<&str> for RatingName {
    fn from(field: &str) -> Self {
        RatingName::Field(field.to_string())
    }
}

/// Venue configuration consumed by every pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub venue_id: String,
    /// Submission invitation id, e.g. `Venue/-/Submission`
    pub submission_id: String,
    /// Per-paper group segment, e.g. `Submission` for `Venue/Submission7/...`
    #[serde(default = "default_submission_name")]
    pub submission_name: String,
    #[serde(default)]
    pub api_version: ApiVersion,

    pub reviewers: RoleConfig,
    #[serde(default)]
    pub area_chairs: Option<RoleConfig>,
    #[serde(default)]
    pub senior_area_chairs: Option<RoleConfig>,

    #[serde(default = "default_official_review_name")]
    pub official_review_name: String,
    #[serde(default = "default_meta_review_name")]
    pub meta_review_name: String,
    #[serde(default = "default_decision_name")]
    pub decision_name: String,
    #[serde(default)]
    pub custom_stage_names: Vec<String>,

    #[serde(default = "default_rating_names")]
    pub review_rating_names: Vec<RatingName>,
    #[serde(default = "default_confidence_name")]
    pub review_confidence_name: String,
    #[serde(default = "default_recommendation_name")]
    pub meta_review_recommendation_name: String,

    /// Official reviews needed for a paper to count as complete; all
    /// assigned reviewers when unset
    #[serde(default)]
    pub review_threshold: Option<usize>,
    /// Bids a member needs to count as done bidding
    #[serde(default = "default_bid_threshold")]
    pub bid_threshold: u64,

    #[serde(default)]
    pub withdrawn_venue_id: Option<String>,
    #[serde(default)]
    pub desk_rejected_venue_id: Option<String>,

    /// Extra structured-query properties: name → JSON pointer into a row
    #[serde(default)]
    pub filter_properties: BTreeMap<String, String>,
    /// Default sort column name
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default)]
    pub default_sort_desc: bool,
}

fn default_submission_name() -> String {
    "Submission".to_string()
}

fn default_official_review_name() -> String {
    "Official_Review".to_string()
}

fn default_meta_review_name() -> String {
    "Meta_Review".to_string()
}

fn default_decision_name() -> String {
    "Decision".to_string()
}

fn default_rating_names() -> Vec<RatingName> {
    vec![RatingName::Field("rating".to_string())]
}

fn default_confidence_name() -> String {
    "confidence".to_string()
}

fn default_recommendation_name() -> String {
    "recommendation".to_string()
}

fn default_bid_threshold() -> u64 {
    1
}

impl VenueConfig {
    /// Minimal configuration with defaults for everything optional
    pub fn new(venue_id: impl Into<String>, submission_id: impl Into<String>) -> Self {
        Self {
            venue_id: venue_id.into(),
            submission_id: submission_id.into(),
            submission_name: default_submission_name(),
            api_version: ApiVersion::default(),
            reviewers: RoleConfig::new("Reviewers", "Reviewer_"),
            area_chairs: None,
            senior_area_chairs: None,
            official_review_name: default_official_review_name(),
            meta_review_name: default_meta_review_name(),
            decision_name: default_decision_name(),
            custom_stage_names: Vec::new(),
            review_rating_names: default_rating_names(),
            review_confidence_name: default_confidence_name(),
            meta_review_recommendation_name: default_recommendation_name(),
            review_threshold: None,
            bid_threshold: default_bid_threshold(),
            withdrawn_venue_id: None,
            desk_rejected_venue_id: None,
            filter_properties: BTreeMap::new(),
            default_sort: None,
            default_sort_desc: false,
        }
    }

    /// Names of required fields that are unset
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let mut check = |name: &str, value: &str| {
            if value.trim().is_empty() {
                missing.push(name.to_string());
            }
        };

        check("venue_id", &self.venue_id);
        check("submission_id", &self.submission_id);
        check("submission_name", &self.submission_name);
        check("reviewers.name", &self.reviewers.name);
        check("reviewers.anon_prefix", &self.reviewers.anon_prefix);
        check("official_review_name", &self.official_review_name);
        check("decision_name", &self.decision_name);
        if let Some(ac) = &self.area_chairs {
            check("area_chairs.name", &ac.name);
            check("area_chairs.anon_prefix", &ac.anon_prefix);
            check("meta_review_name", &self.meta_review_name);
        }
        if let Some(sac) = &self.senior_area_chairs {
            check("senior_area_chairs.name", &sac.name);
            check("senior_area_chairs.anon_prefix", &sac.anon_prefix);
        }
        for (i, rating) in self.review_rating_names.iter().enumerate() {
            if rating.label().is_empty() || rating.fields().is_empty() {
                missing.push(format!("review_rating_names[{}]", i));
            }
        }

        missing
    }

    /// Reject candidate maps carrying more than one label
    pub fn check_rating_names(&self) -> Result<()> {
        for (i, rating) in self.review_rating_names.iter().enumerate() {
            if let RatingName::Candidates(map) = rating {
                if map.len() > 1 {
                    let labels: Vec<&str> = map.keys().map(String::as_str).collect();
                    return Err(Error::Config(format!(
                        "review_rating_names[{}] has several labels ({}); use one entry per label",
                        i,
                        labels.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fail with `MissingProperties` when any required field is unset, or
    /// `Config` when a rating entry is ambiguous
    pub fn require_complete(&self) -> Result<()> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(Error::MissingProperties(missing));
        }
        self.check_rating_names()
    }

    pub fn role(&self, kind: RoleKind) -> Option<&RoleConfig> {
        match kind {
            RoleKind::Reviewers => Some(&self.reviewers),
            RoleKind::AreaChairs => self.area_chairs.as_ref(),
            RoleKind::SeniorAreaChairs => self.senior_area_chairs.as_ref(),
        }
    }

    /// Configured roles in fixed order
    pub fn roles(&self) -> Vec<(RoleKind, &RoleConfig)> {
        RoleKind::ALL
            .iter()
            .filter_map(|kind| self.role(*kind).map(|role| (*kind, role)))
            .collect()
    }

    pub fn committee_id(&self, kind: RoleKind) -> Option<String> {
        self.role(kind).map(|role| {
            role.committee_id
                .clone()
                .unwrap_or_else(|| format!("{}/{}", self.venue_id, role.name))
        })
    }

    /// Bid invitation id for a role, when bidding is configured
    pub fn bid_invitation_id(&self, kind: RoleKind) -> Option<String> {
        let role = self.role(kind)?;
        let bid_name = role.bid_name.as_ref()?;
        Some(format!("{}/-/{}", self.committee_id(kind)?, bid_name))
    }

    /// Prefix shared by every per-paper group, e.g. `Venue/Submission`
    pub fn paper_group_prefix(&self) -> String {
        format!("{}/{}", self.venue_id, self.submission_name)
    }

    /// Venue ids whose papers are excluded from the console
    pub fn excluded_venue_ids(&self) -> Vec<&str> {
        [&self.withdrawn_venue_id, &self.desk_rejected_venue_id]
            .into_iter()
            .filter_map(|id| id.as_deref())
            .collect()
    }
}
