use cohort_events::ClassroomEvent;
use cohort_policy::{
    diff_group, plan_group_names, validate_bulk, GroupPatch, GroupUpdateError, PolicyViolation,
    UpdateOutcome, NO_CHANGES_MESSAGE,
};
use cohort_storage::{
    ClassroomId, CreateGroupsParams, GroupDetail, GroupId, GroupSetDetail, GroupSetId,
    MemberDetail, StoreError,
};
use cohort_view::{view, ViewParams};
use serde::Deserialize;

use super::{Outcome, ServiceError, StoreResultExt};
use crate::server::CohortServer;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupsRequest {
    /// Base name; groups are numbered after it.
    pub name: String,
    pub count: i64,
}

pub(crate) fn find_group<'a>(
    set: &'a GroupSetDetail,
    group_id: &GroupId,
) -> Result<&'a GroupDetail, ServiceError> {
    set.group(group_id).ok_or(ServiceError::NotFound("group"))
}

impl CohortServer {
    pub async fn create_groups(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        req: CreateGroupsRequest,
    ) -> Result<Outcome<GroupSetDetail>, ServiceError> {
        let base = validate_bulk(&req.name, req.count, self.config.max_bulk_groups)?;

        let _guard = self.lock_group_set(group_set_id).await;
        let set = self.load_group_set(classroom_id, group_set_id).await?;

        let names = plan_group_names(
            &base,
            req.count,
            set.groups.iter().map(|g| g.name.as_str()),
            self.config.max_bulk_groups,
        )?;

        // New groups take the set's current default capacity.
        let created = names.len();
        let detail = self
            .store
            .create_groups(&CreateGroupsParams {
                group_set_id: *group_set_id,
                names,
                max_members: set.max_members,
            })
            .await
            .or_not_found("group set")?;

        tracing::info!(group_set_id = %group_set_id, created, base = %base, "groups created");
        self.publish(classroom_id, ClassroomEvent::GroupsetUpdate(detail.clone()))
            .await;

        let noun = if created == 1 { "group" } else { "groups" };
        Ok(Outcome::changed(format!("Created {} {}", created, noun), detail))
    }

    pub async fn update_group(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
        patch: &GroupPatch,
    ) -> Result<Outcome<GroupDetail>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;
        let set = self.load_group_set(classroom_id, group_set_id).await?;
        let group = find_group(&set, group_id)?;

        let changes = match diff_group(group, patch) {
            Ok(UpdateOutcome::Unchanged) => {
                tracing::debug!(group_id = %group_id, "group update was a no-op");
                return Ok(Outcome::unchanged(NO_CHANGES_MESSAGE));
            }
            Ok(UpdateOutcome::Changed(changes)) => changes,
            Err(GroupUpdateError::Invalid(e)) => return Err(e.into()),
            Err(GroupUpdateError::Violation(v)) => {
                tracing::warn!(group_id = %group_id, reason = %v, "group update refused");
                return Err(v.into());
            }
        };

        let detail = self
            .store
            .update_group(group_id, &changes)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => ServiceError::Policy(
                    PolicyViolation::DuplicateGroupName(changes.name.clone().unwrap_or_default()),
                ),
                StoreError::NotFound => ServiceError::NotFound("group"),
                e => ServiceError::Store(e),
            })?;

        tracing::info!(group_id = %group_id, "group updated");
        self.publish(
            classroom_id,
            ClassroomEvent::GroupUpdate {
                group_set_id: *group_set_id,
                group: detail.clone(),
            },
        )
        .await;

        Ok(Outcome::changed("Group updated", detail))
    }

    pub async fn delete_group(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
    ) -> Result<Outcome<GroupId>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;
        let set = self.load_group_set(classroom_id, group_set_id).await?;
        find_group(&set, group_id)?;

        self.store.delete_group(group_id).await.or_not_found("group")?;

        tracing::info!(group_set_id = %group_set_id, group_id = %group_id, "group deleted");
        self.publish(
            classroom_id,
            ClassroomEvent::GroupDelete {
                group_set_id: *group_set_id,
                group_id: *group_id,
            },
        )
        .await;

        Ok(Outcome::changed("Group deleted", *group_id))
    }

    /// Filtered, searched and sorted member list of one group.
    pub async fn group_members(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        group_id: &GroupId,
        params: &ViewParams,
    ) -> Result<Vec<MemberDetail>, ServiceError> {
        let set = self.load_group_set(classroom_id, group_set_id).await?;
        let group = find_group(&set, group_id)?;
        Ok(view(&group.members, params))
    }
}
