use chrono::Utc;
use cohort_events::{ClassroomEvent, Notification, NotificationKind};
use cohort_policy::{
    decide_join, decide_leave, plan_batch, BatchAction, LeaveDecision, ValidationError,
};
use cohort_storage::{
    ClassroomId, GroupDetail, GroupId, GroupSetId, MembershipChange, MembershipStatus, StoreError,
    StudentId,
};
use serde::Serialize;

use super::groups::find_group;
use super::{Outcome, ServiceError, StoreResultExt};
use crate::server::CohortServer;

/// What a teacher batch action did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub affected: usize,
    pub skipped: Vec<StudentId>,
    pub group: GroupDetail,
}

impl CohortServer {
    pub async fn join_group(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
        student_id: &StudentId,
    ) -> Result<Outcome<GroupDetail>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;

        // Checked under the lock so a concurrent classroom removal can't race a join.
        self.require_enrolled(classroom_id, student_id).await?;

        let set = self.load_group_set(classroom_id, group_set_id).await?;
        if set.group(group_id).is_none() {
            // Distinguish an unknown group from one that lives in another set.
            self.store.get_group(group_id).await.or_not_found("group")?;
        }

        let membership = decide_join(&set, group_id, student_id, Utc::now()).map_err(|v| {
            tracing::warn!(group_id = %group_id, student_id = %student_id, reason = %v, "join refused");
            v
        })?;

        let group = self
            .store
            .add_membership(&membership)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => ServiceError::Store(StoreError::Conflict),
                // The group was found under the lock, so only the enrollment can be missing.
                StoreError::NotFound => {
                    ServiceError::Forbidden("You are not enrolled in this classroom".to_string())
                }
                e => ServiceError::Store(e),
            })?;

        tracing::info!(
            group_id = %group_id,
            student_id = %student_id,
            status = %membership.status,
            "student joined group"
        );
        self.publish(
            classroom_id,
            ClassroomEvent::GroupUpdate {
                group_set_id: *group_set_id,
                group: group.clone(),
            },
        )
        .await;

        let message = if membership.status == MembershipStatus::Pending {
            let email = group
                .member(student_id)
                .and_then(|m| m.email.clone())
                .unwrap_or_default();
            self.publish(
                classroom_id,
                ClassroomEvent::Notification(Notification {
                    kind: NotificationKind::JoinRequest,
                    message: format!("{} requested to join {}", email, group.name),
                    payload: serde_json::json!({
                        "groupSetId": group_set_id,
                        "groupId": group_id,
                        "studentId": student_id,
                    }),
                }),
            )
            .await;
            "Join request sent, waiting for approval"
        } else {
            "Joined group"
        };

        Ok(Outcome::changed(message, group))
    }

    /// Remove the student's own membership, whatever its status.
    pub async fn leave_group(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
        student_id: &StudentId,
    ) -> Result<Outcome<GroupDetail>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;
        let set = self.load_group_set(classroom_id, group_set_id).await?;
        let group = find_group(&set, group_id)?;

        let previous = match decide_leave(group, student_id) {
            LeaveDecision::NotAMember => {
                return Ok(Outcome::unchanged("You are not a member of this group"));
            }
            LeaveDecision::Remove { previous } => previous,
        };

        let group = self
            .store
            .apply_membership_changes(
                group_id,
                &[MembershipChange::Remove {
                    student_id: *student_id,
                }],
            )
            .await?
            .group;

        tracing::info!(group_id = %group_id, student_id = %student_id, previous = %previous, "student left group");
        self.publish(
            classroom_id,
            ClassroomEvent::GroupUpdate {
                group_set_id: *group_set_id,
                group: group.clone(),
            },
        )
        .await;

        Ok(Outcome::changed("Left group", group))
    }

    /// Approve, reject or suspend a selection of members of one group.
    ///
    /// Ids that don't fit the action are skipped; an empty selection is refused
    /// before the store is touched.
    pub async fn apply_batch(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
        action: BatchAction,
        student_ids: &[StudentId],
    ) -> Result<Outcome<BatchReport>, ServiceError> {
        if student_ids.is_empty() {
            return Err(ValidationError::NoSelection.into());
        }

        let _guard = self.lock_group_set(group_set_id).await;
        let set = self.load_group_set(classroom_id, group_set_id).await?;
        let group = find_group(&set, group_id)?;

        let plan = plan_batch(action, group, student_ids, Utc::now())?;
        let message = plan.message();
        if plan.is_empty() {
            tracing::debug!(group_id = %group_id, action = %action, skipped = plan.skipped.len(), "batch had nothing to do");
            return Ok(Outcome::unchanged(message));
        }

        let applied = self
            .store
            .apply_membership_changes(group_id, &plan.changes)
            .await?;
        if applied.touched as usize != plan.affected() {
            // Only reachable if something bypassed the group set lock.
            tracing::warn!(group_id = %group_id, planned = plan.affected(), touched = applied.touched, "batch touched fewer rows than planned");
        }
        let group = applied.group;

        tracing::info!(
            group_id = %group_id,
            action = %action,
            affected = plan.affected(),
            skipped = plan.skipped.len(),
            "batch applied"
        );
        self.publish(
            classroom_id,
            ClassroomEvent::GroupUpdate {
                group_set_id: *group_set_id,
                group: group.clone(),
            },
        )
        .await;

        Ok(Outcome::changed(
            message,
            BatchReport {
                affected: plan.affected(),
                skipped: plan.skipped.iter().map(|(id, _)| *id).collect(),
                group,
            },
        ))
    }

    pub(crate) async fn require_enrolled(
        &self,
        classroom_id: &ClassroomId,
        student_id: &StudentId,
    ) -> Result<(), ServiceError> {
        match self.store.get_enrollment(classroom_id, student_id).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => Err(ServiceError::Forbidden(
                "You are not enrolled in this classroom".to_string(),
            )),
            Err(e) => Err(ServiceError::Store(e)),
        }
    }
}
