//! Classroom roster handlers: enroll, list, remove, leave

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cohort_storage::{ClassroomId, Enrollment, StudentId};

use super::{require_member, ApiPath};
use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;
use crate::service::EnrollRequest;

pub async fn list(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(classroom_id): ApiPath<ClassroomId>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    require_member(&server, &actor, &classroom_id).await?;
    Ok(Json(server.list_roster(&classroom_id).await?))
}

/// Called by the classroom collaborator when a student joins via code, or when
/// their profile changes.
pub async fn enroll(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, student_id)): ApiPath<(ClassroomId, StudentId)>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let Json(req) = payload?;
    let outcome = server
        .enroll_student(&classroom_id, &student_id, req)
        .await?;
    Ok(outcome.into_response())
}

pub async fn remove(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath((classroom_id, student_id)): ApiPath<(ClassroomId, StudentId)>,
) -> Result<Response, ApiError> {
    actor.require_staff()?;
    let outcome = server.remove_student(&classroom_id, &student_id).await?;
    Ok(outcome.into_response())
}

pub async fn leave(
    State(server): State<CohortServer>,
    actor: Actor,
    ApiPath(classroom_id): ApiPath<ClassroomId>,
) -> Result<Response, ApiError> {
    actor.require_student()?;
    let outcome = server
        .remove_student(&classroom_id, &actor.student_id())
        .await?;
    Ok(outcome.into_response())
}
