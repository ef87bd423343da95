//! No-op detection for group set and group updates.
//!
//! A patch carries what the client submitted. Diffing it against the persisted
//! record yields only the fields that actually change; if none do, the update is
//! reported as [`UpdateOutcome::Unchanged`] and nothing is written or published.

use cohort_storage::{GroupChanges, GroupDetail, GroupSet, GroupSetChanges};
use serde::Deserialize;

use crate::{normalize_capacity, validate_name, PolicyViolation, ValidationError};

/// Message returned for updates that change nothing.
pub const NO_CHANGES_MESSAGE: &str = "No changes were made";

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<C> {
    Unchanged,
    Changed(C),
}

/// Submitted group set fields. Absent fields are left as they are.
///
/// `maxMembers: 0` clears the limit; `image: ""` clears the image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSetPatch {
    pub name: Option<String>,
    pub self_signup: Option<bool>,
    pub join_approval: Option<bool>,
    pub max_members: Option<i64>,
    pub image: Option<String>,
}

/// Submitted group fields. Same conventions as [`GroupSetPatch`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    pub name: Option<String>,
    pub max_members: Option<i64>,
    pub image: Option<String>,
}

fn normalize_image(image: &str) -> Option<String> {
    let trimmed = image.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn diff_group_set(
    current: &GroupSet,
    patch: &GroupSetPatch,
) -> Result<UpdateOutcome<GroupSetChanges>, ValidationError> {
    let mut changes = GroupSetChanges::default();

    if let Some(name) = &patch.name {
        let name = validate_name(name)?;
        if name != current.name {
            changes.name = Some(name);
        }
    }
    if let Some(v) = patch.self_signup.filter(|v| *v != current.self_signup) {
        changes.self_signup = Some(v);
    }
    if let Some(v) = patch.join_approval.filter(|v| *v != current.join_approval) {
        changes.join_approval = Some(v);
    }
    if patch.max_members.is_some() {
        let max = normalize_capacity(patch.max_members)?;
        if max != current.max_members {
            changes.max_members = Some(max);
        }
    }
    if let Some(image) = &patch.image {
        let image = normalize_image(image);
        if image != current.image {
            changes.image = Some(image);
        }
    }

    Ok(if changes.is_empty() {
        UpdateOutcome::Unchanged
    } else {
        UpdateOutcome::Changed(changes)
    })
}

/// Errors from [`diff_group`], which both validates input and guards capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUpdateError {
    Invalid(ValidationError),
    Violation(PolicyViolation),
}

impl From<ValidationError> for GroupUpdateError {
    fn from(e: ValidationError) -> Self {
        GroupUpdateError::Invalid(e)
    }
}

/// Diff a group patch. A new capacity below the group's active count is refused
/// so the capacity invariant never goes false after the fact.
pub fn diff_group(
    current: &GroupDetail,
    patch: &GroupPatch,
) -> Result<UpdateOutcome<GroupChanges>, GroupUpdateError> {
    let mut changes = GroupChanges::default();

    if let Some(name) = &patch.name {
        let name = validate_name(name)?;
        if name != current.name {
            changes.name = Some(name);
        }
    }
    if patch.max_members.is_some() {
        let max = normalize_capacity(patch.max_members)?;
        if max != current.max_members {
            if let Some(requested) = max {
                let active = current.active_count();
                if (requested as usize) < active {
                    return Err(GroupUpdateError::Violation(
                        PolicyViolation::CapacityBelowActive { requested, active },
                    ));
                }
            }
            changes.max_members = Some(max);
        }
    }
    if let Some(image) = &patch.image {
        let image = normalize_image(image);
        if image != current.image {
            changes.image = Some(image);
        }
    }

    Ok(if changes.is_empty() {
        UpdateOutcome::Unchanged
    } else {
        UpdateOutcome::Changed(changes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::fixtures::*;
    use chrono::Utc;
    use cohort_storage::{MembershipStatus, StudentId};

    fn stored_set() -> GroupSet {
        let d = set(true, Some(3), 0);
        GroupSet {
            id: d.id,
            classroom_id: d.classroom_id,
            name: d.name,
            self_signup: d.self_signup,
            join_approval: d.join_approval,
            max_members: d.max_members,
            image: None,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }

    #[test]
    fn identical_values_are_unchanged() {
        let current = stored_set();
        let patch = GroupSetPatch {
            name: Some(" Lab Teams ".into()),
            self_signup: Some(true),
            join_approval: Some(true),
            max_members: Some(3),
            image: Some(String::new()),
        };
        assert_eq!(diff_group_set(&current, &patch).unwrap(), UpdateOutcome::Unchanged);
        assert_eq!(
            diff_group_set(&current, &GroupSetPatch::default()).unwrap(),
            UpdateOutcome::Unchanged
        );
    }

    #[test]
    fn only_differing_fields_are_carried() {
        let current = stored_set();
        let patch = GroupSetPatch {
            name: Some("Lab Teams".into()),
            join_approval: Some(false),
            max_members: Some(0),
            ..Default::default()
        };
        let UpdateOutcome::Changed(changes) = diff_group_set(&current, &patch).unwrap() else {
            panic!("expected a change");
        };
        assert_eq!(
            changes,
            GroupSetChanges {
                join_approval: Some(false),
                max_members: Some(None),
                ..Default::default()
            }
        );
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let current = stored_set();
        let empty_name = GroupSetPatch {
            name: Some("".into()),
            ..Default::default()
        };
        assert_eq!(
            diff_group_set(&current, &empty_name).unwrap_err(),
            ValidationError::EmptyName
        );
        let negative = GroupSetPatch {
            max_members: Some(-5),
            ..Default::default()
        };
        assert_eq!(
            diff_group_set(&current, &negative).unwrap_err(),
            ValidationError::NegativeCapacity(-5)
        );
    }

    #[test]
    fn group_capacity_cannot_drop_below_active_members() {
        let mut s = set(false, Some(3), 1);
        let now = Utc::now();
        s.groups[0].members.push(member(StudentId::new(), MembershipStatus::Approved, now));
        s.groups[0].members.push(member(StudentId::new(), MembershipStatus::Pending, now));
        s.groups[0].members.push(member(StudentId::new(), MembershipStatus::Suspended, now));
        let group = &s.groups[0];

        let too_small = GroupPatch {
            max_members: Some(1),
            ..Default::default()
        };
        assert_eq!(
            diff_group(group, &too_small).unwrap_err(),
            GroupUpdateError::Violation(PolicyViolation::CapacityBelowActive {
                requested: 1,
                active: 2
            })
        );

        let exact = GroupPatch {
            max_members: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            diff_group(group, &exact).unwrap(),
            UpdateOutcome::Changed(GroupChanges {
                max_members: Some(Some(2)),
                ..
            })
        ));
    }

    #[test]
    fn group_rename_to_same_name_is_unchanged() {
        let s = set(false, None, 1);
        let patch = GroupPatch {
            name: Some("Team 1".into()),
            max_members: Some(0),
            image: None,
        };
        assert_eq!(diff_group(&s.groups[0], &patch).unwrap(), UpdateOutcome::Unchanged);
    }
}
