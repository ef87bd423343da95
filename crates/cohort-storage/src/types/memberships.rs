//! Membership types: one student's relationship to one group.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupDetail, GroupId, StudentId};

/// Membership status.
///
/// `Pending` and `Approved` are "active": they count against group capacity and
/// against the one-active-membership-per-group-set rule. `Suspended` does neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Suspended,
}

/// Error type for parsing MembershipStatus from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMembershipStatusError(pub String);

impl std::fmt::Display for ParseMembershipStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid membership status: {}", self.0)
    }
}

impl std::error::Error for ParseMembershipStatusError {}

impl FromStr for MembershipStatus {
    type Err = ParseMembershipStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "approved" => Ok(MembershipStatus::Approved),
            "suspended" => Ok(MembershipStatus::Suspended),
            _ => Err(ParseMembershipStatusError(s.to_string())),
        }
    }
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Approved => "approved",
            MembershipStatus::Suspended => "suspended",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MembershipStatus::Pending | MembershipStatus::Approved)
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership record
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub group_id: GroupId,
    pub student_id: StudentId,
    pub status: MembershipStatus,
    /// Set when the membership enters `Approved`.
    pub join_date: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
}

/// A single mutation within a batch applied atomically to one group.
#[derive(Clone, Debug, PartialEq)]
pub enum MembershipChange {
    SetStatus {
        student_id: StudentId,
        status: MembershipStatus,
        join_date: Option<DateTime<Utc>>,
    },
    Remove {
        student_id: StudentId,
    },
}

/// Result of [`MembershipChange`]s applied to one group.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedChanges {
    /// Memberships actually updated or removed.
    pub touched: u64,
    pub group: GroupDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            MembershipStatus::Pending,
            MembershipStatus::Approved,
            MembershipStatus::Suspended,
        ] {
            assert_eq!(status.as_str().parse::<MembershipStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "banned".parse::<MembershipStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid membership status: banned");
    }

    #[test]
    fn only_pending_and_approved_are_active() {
        assert!(MembershipStatus::Pending.is_active());
        assert!(MembershipStatus::Approved.is_active());
        assert!(!MembershipStatus::Suspended.is_active());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&MembershipStatus::Suspended).unwrap();
        assert_eq!(json, "\"suspended\"");
    }
}
