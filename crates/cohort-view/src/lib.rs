//! Member list projection: filter by status, search by email, sort.
//!
//! Pure and stateless; callers pass every parameter explicitly, so the same
//! inputs always give the same ordering.

use std::cmp::{Ordering, Reverse};

use cohort_storage::{MemberDetail, MembershipStatus};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Suspended,
}

impl StatusFilter {
    fn admits(&self, status: MembershipStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == MembershipStatus::Pending,
            StatusFilter::Approved => status == MembershipStatus::Approved,
            StatusFilter::Suspended => status == MembershipStatus::Suspended,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Email,
    Status,
    /// Newest join date first; members who have not joined yet go last.
    Date,
}

/// Query parameters for a member list view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    pub status: StatusFilter,
    pub sort: SortKey,
    pub search: String,
}

fn email_of(m: &MemberDetail) -> &str {
    m.email.as_deref().unwrap_or("")
}

/// Project a member list.
///
/// The search is a case-insensitive substring match on email. A member with no
/// roster email only matches an empty search. Ties keep their input order.
pub fn view(members: &[MemberDetail], params: &ViewParams) -> Vec<MemberDetail> {
    let needle = params.search.trim().to_lowercase();

    let mut out: Vec<MemberDetail> = members
        .iter()
        .filter(|m| params.status.admits(m.status))
        .filter(|m| needle.is_empty() || email_of(m).to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match params.sort {
        SortKey::Email => out.sort_by_cached_key(|m| email_of(m).to_lowercase()),
        SortKey::Status => out.sort_by(|a, b| a.status.as_str().cmp(b.status.as_str())),
        SortKey::Date => out.sort_by(|a, b| match (a.join_date, b.join_date) {
            (Some(x), Some(y)) => Reverse(x).cmp(&Reverse(y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }

    out
}
