//! Identity resolution
//!
//! Maps per-paper committee groups to real members and their per-paper
//! anonymous ids, and collapses the identifiers one person may appear under
//! (profile id, usernames, emails) into a single profile.
//!
//! Group ids have the form `<venue>/<submission_name><N>/<rest>`:
//! - `rest == role.name` is the named group listing real members
//! - `rest` starting with `role.anon_prefix` is an anonymous group whose
//!   single member is the real identity behind it

use once_cell::sync::Lazy;
use orc_common::model::{Group, Profile};
use orc_common::{RoleConfig, RoleKind, VenueConfig};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Tilde-id or valid email
pub fn is_valid_member_id(value: &str) -> bool {
    value.starts_with('~') || is_valid_email(value)
}

/// Display fields of a profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub preferred_name: Option<String>,
    pub preferred_email: Option<String>,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            preferred_name: profile.preferred_name().map(str::to_string),
            preferred_email: profile.preferred_email().map(str::to_string),
        }
    }
}

/// Alias → profile lookup
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    alias_to_profile: BTreeMap<String, String>,
    profiles: BTreeMap<String, ProfileSummary>,
}

impl AliasMap {
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        let mut map = AliasMap::default();
        for profile in profiles {
            for alias in profile.aliases() {
                map.alias_to_profile
                    .entry(alias.to_string())
                    .or_insert_with(|| profile.id.clone());
            }
            map.profiles
                .insert(profile.id.clone(), ProfileSummary::from(profile));
        }
        map
    }

    /// Profile id an identifier belongs to, when known
    pub fn profile_id(&self, identifier: &str) -> Option<&str> {
        self.alias_to_profile.get(identifier).map(String::as_str)
    }

    /// Profile id when known, else the identifier itself
    pub fn canonical(&self, identifier: &str) -> String {
        self.profile_id(identifier)
            .unwrap_or(identifier)
            .to_string()
    }

    pub fn summary(&self, identifier: &str) -> Option<&ProfileSummary> {
        self.profile_id(identifier)
            .and_then(|id| self.profiles.get(id))
    }

    /// True when both identifiers refer to the same person
    pub fn same_person(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (self.profile_id(a), self.profile_id(b)) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// One member assigned to a paper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMember {
    /// Identifier as listed in the named group
    pub member_id: String,
    pub anon_group_id: Option<String>,
    /// Anonymous group suffix after the role prefix, e.g. `abc1` of `Reviewer_abc1`
    pub anonymous_id: Option<String>,
    pub profile: Option<ProfileSummary>,
}

/// Assignments of one role on one paper
#[derive(Debug, Clone, Default)]
pub struct PaperRoleAssignments {
    pub members: Vec<ResolvedMember>,
    /// Anonymous group id → the real member behind it
    pub anon_groups: BTreeMap<String, String>,
}

impl PaperRoleAssignments {
    /// Anonymous group of a real identifier, matching through aliases
    pub fn anon_group_for(&self, member: &str, aliases: &AliasMap) -> Option<&str> {
        self.anon_groups
            .iter()
            .find(|(_, real)| aliases.same_person(real, member))
            .map(|(group_id, _)| group_id.as_str())
    }

    /// Real member behind an anonymous group
    pub fn member_for(&self, anon_group_id: &str) -> Option<&str> {
        self.anon_groups.get(anon_group_id).map(String::as_str)
    }
}

/// Assignments of one role across all papers
#[derive(Debug, Clone)]
pub struct RoleAssignments {
    pub kind: RoleKind,
    pub anon_prefix: String,
    pub by_paper: BTreeMap<u64, PaperRoleAssignments>,
}

impl RoleAssignments {
    pub fn paper(&self, number: u64) -> Option<&PaperRoleAssignments> {
        self.by_paper.get(&number)
    }

    /// Anonymous id carried by an anonymous group id of this role
    pub fn anonymous_id(&self, group_id: &str) -> Option<String> {
        anonymous_suffix(group_id, &self.anon_prefix)
    }
}

/// Suffix of the last path segment after `anon_prefix`
pub fn anonymous_suffix(group_id: &str, anon_prefix: &str) -> Option<String> {
    let last = group_id.rsplit('/').next()?;
    last.strip_prefix(anon_prefix)
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_string)
}

/// Split `<prefix><N>/<rest>` into `(N, rest)`
pub fn parse_paper_group<'g>(group_id: &'g str, prefix: &str) -> Option<(u64, &'g str)> {
    let tail = group_id.strip_prefix(prefix)?;
    let (number, rest) = tail.split_once('/')?;
    if rest.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((number.parse().ok()?, rest))
}

pub struct IdentityResolver<'a> {
    venue: &'a VenueConfig,
    aliases: &'a AliasMap,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(venue: &'a VenueConfig, aliases: &'a AliasMap) -> Self {
        Self { venue, aliases }
    }

    /// Resolve assignments for every configured role
    pub fn resolve(&self, groups: &[Group]) -> BTreeMap<RoleKind, RoleAssignments> {
        self.venue
            .roles()
            .into_iter()
            .map(|(kind, role)| (kind, self.resolve_role(kind, role, groups)))
            .collect()
    }

    pub fn resolve_role(&self, kind: RoleKind, role: &RoleConfig, groups: &[Group]) -> RoleAssignments {
        let prefix = self.venue.paper_group_prefix();
        let mut named: BTreeMap<u64, &[String]> = BTreeMap::new();
        let mut by_paper: BTreeMap<u64, PaperRoleAssignments> = BTreeMap::new();

        for group in groups {
            let Some((number, rest)) = parse_paper_group(&group.id, &prefix) else {
                continue;
            };
            if rest == role.name {
                named.insert(number, &group.members);
            } else if rest.starts_with(&role.anon_prefix) && !rest.contains('/') {
                if let Some(real) = group.members.first() {
                    by_paper
                        .entry(number)
                        .or_default()
                        .anon_groups
                        .insert(group.id.clone(), real.clone());
                }
            }
        }

        for (number, members) in named {
            let paper = by_paper.entry(number).or_default();
            let mut resolved = Vec::with_capacity(members.len());

            for member in members {
                let (real, anon_group_id) = match paper.member_for(member) {
                    Some(real) => (real.to_string(), Some(member.clone())),
                    None => (
                        member.clone(),
                        paper
                            .anon_group_for(member, self.aliases)
                            .map(str::to_string),
                    ),
                };

                if kind.requires_valid_member_id() && !is_valid_member_id(&real) {
                    tracing::debug!(paper = number, member = %real, role = %kind, "Skipping invalid member id");
                    continue;
                }

                let anonymous_id = anon_group_id
                    .as_deref()
                    .and_then(|id| anonymous_suffix(id, &role.anon_prefix));
                resolved.push(ResolvedMember {
                    profile: self.aliases.summary(&real).cloned(),
                    member_id: real,
                    anon_group_id,
                    anonymous_id,
                });
            }

            paper.members = resolved;
        }

        RoleAssignments {
            kind,
            anon_prefix: role.anon_prefix.clone(),
            by_paper,
        }
    }
}
