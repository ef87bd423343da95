use cohort_events::ClassroomEvent;
use cohort_policy::{
    diff_group_set, normalize_capacity, validate_name, GroupSetPatch, UpdateOutcome,
    NO_CHANGES_MESSAGE,
};
use cohort_storage::{ClassroomId, CreateGroupSetParams, GroupSetDetail, GroupSetId};
use serde::Deserialize;

use super::{Outcome, ServiceError, StoreResultExt};
use crate::server::CohortServer;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupSetRequest {
    pub name: String,
    #[serde(default)]
    pub self_signup: bool,
    #[serde(default)]
    pub join_approval: bool,
    /// `0` or absent is unlimited.
    pub max_members: Option<i64>,
    pub image: Option<String>,
}

impl CohortServer {
    pub async fn list_group_sets(
        &self,
        classroom_id: &ClassroomId,
    ) -> Result<Vec<GroupSetDetail>, ServiceError> {
        Ok(self.store.list_group_set_details(classroom_id).await?)
    }

    pub async fn get_group_set(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
    ) -> Result<GroupSetDetail, ServiceError> {
        self.load_group_set(classroom_id, group_set_id).await
    }

    pub async fn create_group_set(
        &self,
        classroom_id: &ClassroomId,
        req: CreateGroupSetRequest,
    ) -> Result<Outcome<GroupSetDetail>, ServiceError> {
        let name = validate_name(&req.name)?;
        let max_members = normalize_capacity(req.max_members)?;
        let image = req
            .image
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        let detail = self
            .store
            .create_group_set(&CreateGroupSetParams {
                classroom_id: *classroom_id,
                name,
                self_signup: req.self_signup,
                join_approval: req.join_approval,
                max_members,
                image,
            })
            .await?;

        tracing::info!(classroom_id = %classroom_id, group_set_id = %detail.id, name = %detail.name, "group set created");
        self.publish(classroom_id, ClassroomEvent::GroupsetCreate(detail.clone()))
            .await;

        Ok(Outcome::changed("Group set created", detail))
    }

    pub async fn update_group_set(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
        patch: &GroupSetPatch,
    ) -> Result<Outcome<GroupSetDetail>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;

        let current = self
            .store
            .get_group_set(group_set_id)
            .await
            .or_not_found("group set")?;
        if current.classroom_id != *classroom_id {
            return Err(ServiceError::NotFound("group set"));
        }

        let changes = match diff_group_set(&current, patch)? {
            UpdateOutcome::Unchanged => {
                tracing::debug!(group_set_id = %group_set_id, "group set update was a no-op");
                return Ok(Outcome::unchanged(NO_CHANGES_MESSAGE));
            }
            UpdateOutcome::Changed(changes) => changes,
        };

        let detail = self
            .store
            .update_group_set(group_set_id, &changes)
            .await
            .or_not_found("group set")?;

        tracing::info!(group_set_id = %group_set_id, "group set updated");
        self.publish(classroom_id, ClassroomEvent::GroupsetUpdate(detail.clone()))
            .await;

        Ok(Outcome::changed("Group set updated", detail))
    }

    pub async fn delete_group_set(
        &self,
        classroom_id: &ClassroomId,
        group_set_id: &GroupSetId,
    ) -> Result<Outcome<GroupSetId>, ServiceError> {
        let _guard = self.lock_group_set(group_set_id).await;

        let current = self
            .store
            .get_group_set(group_set_id)
            .await
            .or_not_found("group set")?;
        if current.classroom_id != *classroom_id {
            return Err(ServiceError::NotFound("group set"));
        }

        self.store
            .delete_group_set(group_set_id)
            .await
            .or_not_found("group set")?;

        tracing::info!(classroom_id = %classroom_id, group_set_id = %group_set_id, "group set deleted");
        self.publish(
            classroom_id,
            ClassroomEvent::GroupsetDelete {
                group_set_id: *group_set_id,
            },
        )
        .await;

        Ok(Outcome::changed("Group set deleted", *group_set_id))
    }
}
