//! Join and leave decisions.

use chrono::{DateTime, Utc};
use cohort_storage::{GroupDetail, GroupId, GroupSetDetail, Membership, MembershipStatus, StudentId};

use crate::PolicyViolation;

/// Decide a student's request to join `group_id` within `set`.
///
/// Rules are checked in order and the first violation wins:
/// 1. the group belongs to the set,
/// 2. the student holds no pending/approved membership anywhere in the set,
/// 3. the group has a free slot (suspended members don't count),
/// 4. the new status follows the set's join-approval flag.
///
/// A student with a suspended membership in the target group itself cannot
/// rejoin it; suspension is only cleared by leaving or removal.
pub fn decide_join(
    set: &GroupSetDetail,
    group_id: &GroupId,
    student_id: &StudentId,
    now: DateTime<Utc>,
) -> Result<Membership, PolicyViolation> {
    let group = set.group(group_id).ok_or(PolicyViolation::GroupNotInGroupSet)?;

    if let Some(active) = active_group_of(set, student_id) {
        return Err(PolicyViolation::AlreadyActiveInGroupSet {
            group_name: active.name.clone(),
        });
    }

    if group.member(student_id).is_some() {
        return Err(PolicyViolation::SuspendedInGroup);
    }

    if let Some(max) = group.max_members {
        if group.active_count() >= max as usize {
            return Err(PolicyViolation::GroupFull { max });
        }
    }

    let (status, join_date) = if set.join_approval {
        (MembershipStatus::Pending, None)
    } else {
        (MembershipStatus::Approved, Some(now))
    };

    Ok(Membership {
        group_id: *group_id,
        student_id: *student_id,
        status,
        join_date,
        requested_at: now,
    })
}

/// The group in which the student currently holds a pending or approved membership.
pub fn active_group_of<'a>(set: &'a GroupSetDetail, student_id: &StudentId) -> Option<&'a GroupDetail> {
    set.groups.iter().find(|g| {
        g.member(student_id)
            .map(|m| m.status.is_active())
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Remove the membership, whatever its status.
    Remove { previous: MembershipStatus },
    NotAMember,
}

pub fn decide_leave(group: &GroupDetail, student_id: &StudentId) -> LeaveDecision {
    match group.member(student_id) {
        Some(m) => LeaveDecision::Remove { previous: m.status },
        None => LeaveDecision::NotAMember,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn join_without_approval_is_approved_immediately() {
        let s = set(false, None, 1);
        let g = s.groups[0].id;
        let now = Utc::now();

        let m = decide_join(&s, &g, &StudentId::new(), now).unwrap();
        assert_eq!(m.status, MembershipStatus::Approved);
        assert_eq!(m.join_date, Some(now));
    }

    #[test]
    fn join_with_approval_is_pending_without_join_date() {
        let s = set(true, Some(2), 1);
        let g = s.groups[0].id;

        let m = decide_join(&s, &g, &StudentId::new(), Utc::now()).unwrap();
        assert_eq!(m.status, MembershipStatus::Pending);
        assert_eq!(m.join_date, None);
    }

    #[test]
    fn group_outside_set_is_rejected_first() {
        let mut s = set(true, Some(1), 1);
        let student = StudentId::new();
        // Even an already-active student gets the membership error for a foreign group.
        s.groups[0].members.push(member(student, MembershipStatus::Approved, Utc::now()));

        let err = decide_join(&s, &GroupId::new(), &student, Utc::now()).unwrap_err();
        assert_eq!(err, PolicyViolation::GroupNotInGroupSet);
    }

    #[test]
    fn second_active_membership_in_set_is_rejected() {
        let mut s = set(false, None, 2);
        let student = StudentId::new();
        s.groups[0].members.push(member(student, MembershipStatus::Approved, Utc::now()));
        let target = s.groups[1].id;

        let err = decide_join(&s, &target, &student, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            PolicyViolation::AlreadyActiveInGroupSet {
                group_name: "Team 1".into()
            }
        );
    }

    #[test]
    fn pending_membership_also_blocks_other_groups() {
        let mut s = set(true, None, 2);
        let student = StudentId::new();
        s.groups[1].members.push(member(student, MembershipStatus::Pending, Utc::now()));
        let target = s.groups[0].id;

        assert!(matches!(
            decide_join(&s, &target, &student, Utc::now()),
            Err(PolicyViolation::AlreadyActiveInGroupSet { .. })
        ));
    }

    #[test]
    fn suspended_elsewhere_does_not_block() {
        let mut s = set(false, None, 2);
        let student = StudentId::new();
        s.groups[0].members.push(member(student, MembershipStatus::Suspended, Utc::now()));
        let target = s.groups[1].id;

        assert!(decide_join(&s, &target, &student, Utc::now()).is_ok());
    }

    #[test]
    fn suspended_in_target_group_cannot_rejoin() {
        let mut s = set(false, None, 1);
        let student = StudentId::new();
        s.groups[0].members.push(member(student, MembershipStatus::Suspended, Utc::now()));
        let target = s.groups[0].id;

        assert_eq!(
            decide_join(&s, &target, &student, Utc::now()).unwrap_err(),
            PolicyViolation::SuspendedInGroup
        );
    }

    #[test]
    fn capacity_counts_pending_and_approved_only() {
        let mut s = set(true, Some(2), 1);
        let now = Utc::now();
        s.groups[0].members.push(member(StudentId::new(), MembershipStatus::Approved, now));
        s.groups[0].members.push(member(StudentId::new(), MembershipStatus::Pending, now));
        let g = s.groups[0].id;

        assert_eq!(
            decide_join(&s, &g, &StudentId::new(), now).unwrap_err(),
            PolicyViolation::GroupFull { max: 2 }
        );

        // Suspending one frees a slot.
        s.groups[0].members[0].status = MembershipStatus::Suspended;
        assert!(decide_join(&s, &g, &StudentId::new(), now).is_ok());
    }

    #[test]
    fn leave_reports_not_a_member() {
        let s = set(false, None, 1);
        assert_eq!(
            decide_leave(&s.groups[0], &StudentId::new()),
            LeaveDecision::NotAMember
        );
    }

    #[test]
    fn leave_removes_regardless_of_status() {
        let mut s = set(false, None, 1);
        let student = StudentId::new();
        s.groups[0].members.push(member(student, MembershipStatus::Suspended, Utc::now()));

        assert_eq!(
            decide_leave(&s.groups[0], &student),
            LeaveDecision::Remove {
                previous: MembershipStatus::Suspended
            }
        );
    }
}
