//! Group set handlers: list, get, create, update, delete

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohort_policy::GroupSetPatch;
use cohort_storage::{ClassroomId, GroupSetDetail, GroupSetId};

use super::{created, require_member, ApiPath};
use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;
use crate::service::CreateGroupSetRequest;

pub async fn list(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(classroom_id): ApiPath<ClassroomId>,
) -> Result<Json<Vec<GroupSetDetail>>, ApiError> {
    require_member(&server, &actor, &classroom_id).await?;
    Ok(Json(server.list_group_sets(&classroom_id).await?))
}

pub async fn get_one(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id)): ApiPath<(ClassroomId, GroupSetId)>,
) -> Result<Json<GroupSetDetail>, ApiError> {
    require_member(&server, &actor, &classroom_id).await?;
    Ok(Json(server.get_group_set(&classroom_id, &group_set_id).await?))
}

pub async fn create(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(classroom_id): ApiPath<ClassroomId>,
    payload: Result<Json<CreateGroupSetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(req) = payload?;
    let outcome = server.create_group_set(&classroom_id, req).await?;
    Ok(created(outcome))
}

pub async fn update(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id)): ApiPath<(ClassroomId, GroupSetId)>,
    payload: Result<Json<GroupSetPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(patch) = payload?;
    let outcome = server
        .update_group_set(&classroom_id, &group_set_id, &patch)
        .await?;
    Ok(outcome.into_response())
}

pub async fn delete(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id)): ApiPath<(ClassroomId, GroupSetId)>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let outcome = server.delete_group_set(&classroom_id, &group_set_id).await?;
    Ok(outcome.into_response())
}
