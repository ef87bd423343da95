//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait the membership service depends on.
///
/// Every mutating method is atomic: it either commits all of its writes or none.
/// Methods that return a populated model read it inside the same transaction, so
/// a successful return always describes what was committed.
/// Deleting a group set removes its groups and their memberships; deleting a group
/// removes its memberships; removing an enrollment removes the student's
/// memberships in every group set of that classroom.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Roster ─────────────────────────────────────────

    /// Enroll a student in a classroom, or refresh their email/name if already enrolled.
    /// Returns the entry together with the classroom roster as committed.
    async fn upsert_enrollment(&self, params: &EnrollStudentParams)
        -> Result<EnrollmentUpdate, StoreError>;

    /// Get a single roster entry.
    async fn get_enrollment(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<Enrollment, StoreError>;

    /// List the roster of a classroom, ordered by email.
    async fn list_enrollments(
        &self,
        classroom_id: &ClassroomId,
    ) -> Result<Vec<Enrollment>, StoreError>;

    /// Remove a student from a classroom together with all of their memberships in
    /// the classroom's group sets. Returns the remaining roster and the populated
    /// group sets that lost a membership, as committed.
    async fn remove_enrollment(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<EnrollmentRemoval, StoreError>;

    // ───────────────────────────────────── Group sets ─────────────────────────────────────

    /// Create a group set and return it populated (with no groups yet).
    async fn create_group_set(&self, params: &CreateGroupSetParams)
        -> Result<GroupSetDetail, StoreError>;

    /// Get a group set by ID.
    async fn get_group_set(&self, group_set_id: &GroupSetId) -> Result<GroupSet, StoreError>;

    /// List the group sets of a classroom, oldest first.
    async fn list_group_sets(&self, classroom_id: &ClassroomId)
        -> Result<Vec<GroupSet>, StoreError>;

    /// Overwrite the fields present in `changes` and return the populated group set.
    async fn update_group_set(
        &self,
        group_set_id: &GroupSetId,
        changes: &GroupSetChanges,
    ) -> Result<GroupSetDetail, StoreError>;

    /// Delete a group set (and all its groups and memberships).
    async fn delete_group_set(&self, group_set_id: &GroupSetId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Create one group per name in a single transaction and return the populated
    /// group set including the new groups.
    async fn create_groups(&self, params: &CreateGroupsParams)
        -> Result<GroupSetDetail, StoreError>;

    /// Get a group by ID.
    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError>;

    /// List the groups of a group set in creation order.
    async fn list_groups(&self, group_set_id: &GroupSetId) -> Result<Vec<Group>, StoreError>;

    /// Overwrite the fields present in `changes` and return the populated group.
    async fn update_group(&self, group_id: &GroupId, changes: &GroupChanges)
        -> Result<GroupDetail, StoreError>;

    /// Delete a group (and all its memberships).
    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Memberships ────────────────────────────────────

    /// List every membership across all groups of a group set.
    async fn list_group_set_memberships(
        &self,
        group_set_id: &GroupSetId,
    ) -> Result<Vec<Membership>, StoreError>;

    /// Insert a new membership and return the populated group.
    ///
    /// The row is only written while the student is enrolled in the classroom
    /// owning the group; otherwise, or when the group is gone, `NotFound`.
    /// A student already present in the group is `AlreadyExists`.
    async fn add_membership(&self, membership: &Membership) -> Result<GroupDetail, StoreError>;

    /// Apply a batch of status changes and removals to one group atomically.
    async fn apply_membership_changes(
        &self,
        group_id: &GroupId,
        changes: &[MembershipChange],
    ) -> Result<AppliedChanges, StoreError>;

    // ───────────────────────────────────── Read models ────────────────────────────────────

    /// Populated group set (groups with members), read from one consistent snapshot.
    async fn get_group_set_detail(&self, group_set_id: &GroupSetId)
        -> Result<GroupSetDetail, StoreError>;

    /// All populated group sets of a classroom, read from one consistent snapshot.
    async fn list_group_set_details(
        &self,
        classroom_id: &ClassroomId,
    ) -> Result<Vec<GroupSetDetail>, StoreError>;

    /// Populated group, read from one consistent snapshot.
    async fn get_group_detail(&self, group_id: &GroupId) -> Result<GroupDetail, StoreError>;
}
