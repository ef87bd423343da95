//! HTTP surface.
//!
//! Handler modules by domain:
//! - group_sets: list, get, create, update, delete
//! - groups: bulk create, update, delete, member view
//! - memberships: join, leave, approve, reject, suspend
//! - roster: enroll, list, remove, leave classroom
//! - events: WebSocket subscription to a classroom room
//!
//! Successful mutations answer `{"outcome": "changed", "message", "data"}` or,
//! when nothing changed, `{"outcome": "unchanged", "message"}` with status 200.

pub mod events;
pub mod group_sets;
pub mod groups;
pub mod memberships;
pub mod roster;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cohort_storage::ClassroomId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::auth::Actor;
use crate::error::ApiError;
use crate::server::CohortServer;
use crate::service::{Outcome, ServiceError};

pub fn router(server: CohortServer) -> Router {
    let group = "/api/classrooms/{classroom_id}/groupsets/{group_set_id}/groups/{group_id}";

    Router::new()
        .route(
            "/api/classrooms/{classroom_id}/groupsets",
            get(group_sets::list).post(group_sets::create),
        )
        .route(
            "/api/classrooms/{classroom_id}/groupsets/{group_set_id}",
            get(group_sets::get_one)
                .put(group_sets::update)
                .delete(group_sets::delete),
        )
        .route(
            "/api/classrooms/{classroom_id}/groupsets/{group_set_id}/groups",
            post(groups::create),
        )
        .route(group, put(groups::update).delete(groups::delete))
        .route(&format!("{group}/members"), get(groups::members))
        .route(&format!("{group}/join"), post(memberships::join))
        .route(&format!("{group}/leave"), post(memberships::leave))
        .route(&format!("{group}/approve"), post(memberships::approve))
        .route(&format!("{group}/reject"), post(memberships::reject))
        .route(&format!("{group}/suspend"), post(memberships::suspend))
        .route("/api/classrooms/{classroom_id}/students", get(roster::list))
        .route(
            "/api/classrooms/{classroom_id}/students/{student_id}",
            put(roster::enroll).delete(roster::remove),
        )
        .route("/api/classrooms/{classroom_id}/leave", post(roster::leave))
        .route("/api/classrooms/{classroom_id}/events", get(events::subscribe))
        .with_state(server)
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let body = match self {
            Outcome::Changed { message, value } => {
                json!({ "outcome": "changed", "message": message, "data": value })
            }
            Outcome::Unchanged { message } => json!({ "outcome": "unchanged", "message": message }),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// 201 for a creation that happened, plain 200 otherwise.
pub(crate) fn created<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = if outcome.is_changed() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, outcome).into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// [`Path`] whose rejection renders as an [`ApiError`].
pub(crate) struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// [`Query`] whose rejection renders as an [`ApiError`].
pub(crate) struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// Staff may read any classroom; students only the ones they're enrolled in.
pub(crate) async fn require_member(
    server: &CohortServer,
    actor: &Actor,
    classroom_id: &ClassroomId,
) -> Result<(), ServiceError> {
    if actor.is_staff() {
        return Ok(());
    }
    server.require_enrolled(classroom_id, &actor.student_id()).await
}
