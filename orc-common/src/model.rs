//! API entity models
//!
//! Raw resources as the REST API returns them (`Note`, `Group`, `Profile`,
//! `Edge`, `GroupedEdge`, `Invitation`), plus the normalized `Paper` and
//! `Reply` shapes that every stage after the fetch layer works with.
//!
//! Raw structs accept unknown keys and default every optional key so a
//! partially selected response (`select=id,members`) still deserializes.

use crate::content::{ApiVersion, Content};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ========================================
// Raw API resources
// ========================================

/// Note resource (submission or reply)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub forum: Option<String>,
    #[serde(default)]
    pub replyto: Option<String>,
    /// v1 single invitation id
    #[serde(default)]
    pub invitation: Option<String>,
    /// v2 invitation id list
    #[serde(default)]
    pub invitations: Vec<String>,
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default)]
    pub readers: Vec<String>,
    #[serde(default)]
    pub content: Map<String, Value>,
    #[serde(default)]
    pub details: Option<NoteDetails>,
    #[serde(default)]
    pub cdate: Option<i64>,
    #[serde(default)]
    pub ddate: Option<i64>,
}

impl Note {
    /// All invitation ids this note instantiates, v1 and v2 alike
    pub fn invitation_ids(&self) -> Vec<String> {
        let mut ids = self.invitations.clone();
        if let Some(invitation) = &self.invitation {
            if !ids.contains(invitation) {
                ids.push(invitation.clone());
            }
        }
        ids
    }
}

/// Eagerly fetched note details
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetails {
    #[serde(default, alias = "directReplies")]
    pub replies: Vec<Note>,
}

/// Group resource
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Profile resource
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub content: ProfileContent,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileContent {
    #[serde(default)]
    pub names: Vec<ProfileName>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub preferred_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileName {
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferred: bool,
}

impl Profile {
    /// Every identifier that refers to this profile: id, usernames, emails
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases = vec![self.id.as_str()];
        aliases.extend(
            self.content
                .names
                .iter()
                .filter_map(|n| n.username.as_deref()),
        );
        aliases.extend(self.content.emails.iter().map(String::as_str));
        if let Some(preferred) = self.content.preferred_email.as_deref() {
            aliases.push(preferred);
        }
        aliases.sort_unstable();
        aliases.dedup();
        aliases
    }

    /// Preferred full name, falling back to the first name entry
    pub fn preferred_name(&self) -> Option<&str> {
        self.content
            .names
            .iter()
            .find(|n| n.preferred)
            .or_else(|| self.content.names.first())
            .and_then(|n| n.fullname.as_deref())
    }

    /// Preferred email, falling back to the first listed email
    pub fn preferred_email(&self) -> Option<&str> {
        self.content
            .preferred_email
            .as_deref()
            .or_else(|| self.content.emails.first().map(String::as_str))
    }
}

/// Edge resource
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Edge {
    #[serde(default)]
    pub id: Option<String>,
    pub invitation: String,
    pub head: String,
    pub tail: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// One bucket of a `groupBy` edge query
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupedEdge {
    pub id: GroupedEdgeKey,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupedEdgeKey {
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub tail: Option<String>,
}

/// Invitation resource
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Invitation {
    pub id: String,
    #[serde(default)]
    pub duedate: Option<i64>,
    #[serde(default)]
    pub expdate: Option<i64>,
    #[serde(default)]
    pub cdate: Option<i64>,
}

// ========================================
// Normalized shapes
// ========================================

/// Submission with normalized content and replies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub number: u64,
    pub forum: String,
    pub content: Content,
    pub replies: Vec<Reply>,
}

impl Paper {
    /// Normalize a submission note; notes without a number are not papers
    pub fn from_note(note: &Note, version: ApiVersion) -> Option<Self> {
        let number = note.number?;
        let replies = note
            .details
            .as_ref()
            .map(|d| {
                d.replies
                    .iter()
                    .map(|r| Reply::from_note(r, version))
                    .collect()
            })
            .unwrap_or_default();

        Some(Paper {
            id: note.id.clone(),
            number,
            forum: note.forum.clone().unwrap_or_else(|| note.id.clone()),
            content: Content::normalize(&note.content, version),
            replies,
        })
    }

    pub fn title(&self) -> &str {
        self.content.get_str("title").unwrap_or_default()
    }

    /// Venue id tag (`content.venueid`), used to drop withdrawn papers
    pub fn venue_id(&self) -> Option<&str> {
        self.content.get_str("venueid")
    }
}

/// Reply with normalized content
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub forum: String,
    pub replyto: Option<String>,
    pub invitations: Vec<String>,
    pub signatures: Vec<String>,
    pub content: Content,
}

impl Reply {
    pub fn from_note(note: &Note, version: ApiVersion) -> Self {
        Reply {
            id: note.id.clone(),
            forum: note.forum.clone().unwrap_or_default(),
            replyto: note.replyto.clone(),
            invitations: note.invitation_ids(),
            signatures: note.signatures.clone(),
            content: Content::normalize(&note.content, version),
        }
    }

    /// True when one of the invitation ids names `name` (`…/-/<name>`)
    pub fn has_invitation_named(&self, name: &str) -> bool {
        let suffix = format!("/-/{}", name);
        self.invitations.iter().any(|id| id.ends_with(&suffix))
    }

    /// True when one of the invitation ids contains `fragment`
    pub fn has_invitation_containing(&self, fragment: &str) -> bool {
        self.invitations.iter().any(|id| id.contains(fragment))
    }

    pub fn signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }
}
