//! Paper selection and bulk-message drafts
//!
//! The selection holds paper ids and survives filter, sort and page
//! changes. Message recipients are drawn only from selected rows that are
//! loaded; ids of papers no longer present are ignored.

use crate::aggregator::PaperRow;
use crate::identity::ResolvedMember;
use crate::table::FilterError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Selected paper ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    pub fn select(&mut self, paper_id: impl Into<String>) {
        self.0.insert(paper_id.into());
    }

    pub fn deselect(&mut self, paper_id: &str) {
        self.0.remove(paper_id);
    }

    /// Flip one id; returns whether it is now selected
    pub fn toggle(&mut self, paper_id: &str) -> bool {
        if self.0.remove(paper_id) {
            false
        } else {
            self.0.insert(paper_id.to_string());
            true
        }
    }

    pub fn select_all<'r, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'r PaperRow>,
    {
        self.0.extend(rows.into_iter().map(|row| row.id.clone()));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, paper_id: &str) -> bool {
        self.0.contains(paper_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected rows among `rows`, in row order
    pub fn rows<'r>(&self, rows: &'r [PaperRow]) -> Vec<&'r PaperRow> {
        rows.iter().filter(|row| self.contains(&row.id)).collect()
    }
}

/// Who a bulk message goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTarget {
    AllReviewers,
    ReviewersMissingReviews,
    ReviewersSubmittedReviews,
    AreaChairs,
    AreaChairsMissingMetaReviews,
}

impl MessageTarget {
    pub const ALL: [MessageTarget; 5] = [
        MessageTarget::AllReviewers,
        MessageTarget::ReviewersMissingReviews,
        MessageTarget::ReviewersSubmittedReviews,
        MessageTarget::AreaChairs,
        MessageTarget::AreaChairsMissingMetaReviews,
    ];

    fn name(self) -> &'static str {
        match self {
            MessageTarget::AllReviewers => "all_reviewers",
            MessageTarget::ReviewersMissingReviews => "reviewers_missing_reviews",
            MessageTarget::ReviewersSubmittedReviews => "reviewers_submitted_reviews",
            MessageTarget::AreaChairs => "area_chairs",
            MessageTarget::AreaChairsMissingMetaReviews => "area_chairs_missing_meta_reviews",
        }
    }
}

impl fmt::Display for MessageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageTarget {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageTarget::ALL
            .into_iter()
            .find(|target| target.name() == s)
            .ok_or_else(|| FilterError::UnknownTarget(s.to_string()))
    }
}

/// One recipient with the selected papers they are messaged about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub member_id: String,
    pub paper_numbers: Vec<u64>,
}

/// Profile id when resolved, else the listed member id
fn recipient_id(member: &ResolvedMember) -> &str {
    member
        .profile
        .as_ref()
        .map_or(member.member_id.as_str(), |profile| profile.id.as_str())
}

/// De-duplicated recipients ordered by member id
pub fn message_recipients(rows: &[&PaperRow], target: MessageTarget) -> Vec<Recipient> {
    let mut recipients: BTreeMap<String, BTreeSet<u64>> = BTreeMap::new();

    for row in rows {
        let members: Vec<&str> = match target {
            MessageTarget::AllReviewers => row
                .reviewers
                .iter()
                .map(|r| recipient_id(&r.member))
                .collect(),
            MessageTarget::ReviewersMissingReviews => row
                .reviewers
                .iter()
                .filter(|r| !r.has_review)
                .map(|r| recipient_id(&r.member))
                .collect(),
            MessageTarget::ReviewersSubmittedReviews => row
                .reviewers
                .iter()
                .filter(|r| r.has_review)
                .map(|r| recipient_id(&r.member))
                .collect(),
            MessageTarget::AreaChairs => row
                .area_chairs
                .iter()
                .map(|r| recipient_id(&r.member))
                .collect(),
            MessageTarget::AreaChairsMissingMetaReviews => row
                .area_chairs
                .iter()
                .filter(|r| !r.has_review)
                .map(|r| recipient_id(&r.member))
                .collect(),
        };

        for member in members {
            recipients
                .entry(member.to_string())
                .or_default()
                .insert(row.number);
        }
    }

    recipients
        .into_iter()
        .map(|(member_id, papers)| Recipient {
            member_id,
            paper_numbers: papers.into_iter().collect(),
        })
        .collect()
}

/// Message ready to hand to a sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub subject: String,
    pub body: String,
    pub target: MessageTarget,
    pub recipients: Vec<Recipient>,
}

impl MessageDraft {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        target: MessageTarget,
        rows: &[&PaperRow],
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            target,
            recipients: message_recipients(rows, target),
        }
    }
}
