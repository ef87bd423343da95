//! Group handlers: bulk create, update, delete, member view

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohort_policy::GroupPatch;
use cohort_storage::{ClassroomId, GroupId, GroupSetId, MemberDetail};
use cohort_view::ViewParams;

use super::{created, require_member, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;
use crate::service::CreateGroupsRequest;

pub async fn create(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id)): ApiPath<(ClassroomId, GroupSetId)>,
    payload: Result<Json<CreateGroupsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(req) = payload?;
    let outcome = server
        .create_groups(&classroom_id, &group_set_id, req)
        .await?;
    Ok(created(outcome))
}

pub async fn update(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id, group_id)): ApiPath<(ClassroomId, GroupSetId, GroupId)>,
    payload: Result<Json<GroupPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(patch) = payload?;
    let outcome = server
        .update_group(&classroom_id, &group_set_id, &group_id, &patch)
        .await?;
    Ok(outcome.into_response())
}

pub async fn delete(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id, group_id)): ApiPath<(ClassroomId, GroupSetId, GroupId)>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let outcome = server
        .delete_group(&classroom_id, &group_set_id, &group_id)
        .await?;
    Ok(outcome.into_response())
}

/// `?status=all|pending|approved|suspended&sort=email|status|date&search=...`
pub async fn members(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id, group_id)): ApiPath<(ClassroomId, GroupSetId, GroupId)>,
    ApiQuery(params): ApiQuery<ViewParams>,
) -> Result<Json<Vec<MemberDetail>>, ApiError> {
    require_member(&server, &actor, &classroom_id).await?;
    Ok(Json(
        server
            .group_members(&classroom_id, &group_set_id, &group_id, &params)
            .await?,
    ))
}
