//! Populated read models (group set -> groups -> members with roster data).
//!
//! These are the shapes handed to clients and carried on relay events. They are
//! materialized from the normalized records at read time and never written back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ClassroomId, Enrollment, Group, GroupId, GroupSet, GroupSetId, Membership, MembershipStatus,
    StudentId,
};

/// A member as shown in a group roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetail {
    pub student_id: StudentId,
    /// `None` when the student no longer has a roster entry.
    pub email: Option<String>,
    pub name: Option<String>,
    pub status: MembershipStatus,
    pub join_date: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
}

/// A group with its members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    pub id: GroupId,
    pub group_set_id: GroupSetId,
    pub name: String,
    pub max_members: Option<u32>,
    pub image: Option<String>,
    pub members: Vec<MemberDetail>,
}

impl GroupDetail {
    /// Pending plus approved members.
    pub fn active_count(&self) -> usize {
        self.members.iter().filter(|m| m.status.is_active()).count()
    }

    pub fn member(&self, student_id: &StudentId) -> Option<&MemberDetail> {
        self.members.iter().find(|m| &m.student_id == student_id)
    }
}

/// A group set with its groups and their members.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSetDetail {
    pub id: GroupSetId,
    pub classroom_id: ClassroomId,
    pub name: String,
    pub self_signup: bool,
    pub join_approval: bool,
    pub max_members: Option<u32>,
    pub image: Option<String>,
    pub groups: Vec<GroupDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupSetDetail {
    pub fn group(&self, group_id: &GroupId) -> Option<&GroupDetail> {
        self.groups.iter().find(|g| &g.id == group_id)
    }
}

/// Materialize a populated group detail from normalized records.
///
/// Memberships belonging to other groups are ignored. Members are ordered by
/// request time.
pub fn assemble_group(group: Group, memberships: &[Membership], roster: &[Enrollment]) -> GroupDetail {
    let roster: HashMap<&StudentId, &Enrollment> =
        roster.iter().map(|e| (&e.student_id, e)).collect();
    build_group(group, memberships, &roster)
}

/// Materialize a populated group set from normalized records.
///
/// Groups are ordered by creation position; memberships of groups outside this
/// set are ignored.
pub fn assemble_group_set(
    set: GroupSet,
    mut groups: Vec<Group>,
    memberships: &[Membership],
    roster: &[Enrollment],
) -> GroupSetDetail {
    let roster: HashMap<&StudentId, &Enrollment> =
        roster.iter().map(|e| (&e.student_id, e)).collect();

    groups.retain(|g| g.group_set_id == set.id);
    groups.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

    GroupSetDetail {
        id: set.id,
        classroom_id: set.classroom_id,
        name: set.name,
        self_signup: set.self_signup,
        join_approval: set.join_approval,
        max_members: set.max_members,
        image: set.image,
        groups: groups
            .into_iter()
            .map(|g| build_group(g, memberships, &roster))
            .collect(),
        created_at: set.created_at,
        updated_at: set.updated_at,
    }
}

fn build_group(
    group: Group,
    memberships: &[Membership],
    roster: &HashMap<&StudentId, &Enrollment>,
) -> GroupDetail {
    let mut members: Vec<MemberDetail> = memberships
        .iter()
        .filter(|m| m.group_id == group.id)
        .map(|m| {
            let entry = roster.get(&m.student_id);
            MemberDetail {
                student_id: m.student_id,
                email: entry.map(|e| e.email.clone()),
                name: entry.and_then(|e| e.name.clone()),
                status: m.status,
                join_date: m.join_date,
                requested_at: m.requested_at,
            }
        })
        .collect();
    members.sort_by_key(|m| m.requested_at);

    GroupDetail {
        id: group.id,
        group_set_id: group.group_set_id,
        name: group.name,
        max_members: group.max_members,
        image: group.image,
        members,
    }
}
