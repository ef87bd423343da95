//! Membership handlers: student join/leave, teacher approve/reject/suspend

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohort_policy::BatchAction;
use cohort_storage::{ClassroomId, GroupId, GroupSetId, StudentId};
use serde::Deserialize;

use super::ApiPath;
use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;

type GroupPath = ApiPath<(ClassroomId, GroupSetId, GroupId)>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    #[serde(default)]
    pub member_ids: Vec<StudentId>,
}

pub async fn join(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id, group_id)): GroupPath,
) -> Result<Response, ApiError> {
    actor.require_student()?;
    let outcome = server
        .join_group(&classroom_id, &group_set_id, &group_id, &actor.student_id())
        .await?;
    Ok(outcome.into_response())
}

pub async fn leave(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, group_set_id, group_id)): GroupPath,
) -> Result<Response, ApiError> {
    actor.require_student()?;
    let outcome = server
        .leave_group(&classroom_id, &group_set_id, &group_id, &actor.student_id())
        .await?;
    Ok(outcome.into_response())
}

async fn batch(
    server: CohortServer,
    actor: Actor,
    (classroom_id, group_set_id, group_id): (ClassroomId, GroupSetId, GroupId),
    action: BatchAction,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(req) = payload?;
    let outcome = server
        .apply_batch(&classroom_id, &group_set_id, &group_id, action, &req.member_ids)
        .await?;
    Ok(outcome.into_response())
}

pub async fn approve(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(ids): GroupPath,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    batch(server, actor, ids, BatchAction::Approve, payload).await
}

pub async fn reject(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(ids): GroupPath,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    batch(server, actor, ids, BatchAction::Reject, payload).await
}

pub async fn suspend(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(ids): GroupPath,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    batch(server, actor, ids, BatchAction::Suspend, payload).await
}
