//! HTTP surface: identity, status codes and response bodies.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cohort_storage::{ClassroomId, GroupSetDetail, StudentId};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use super::common::*;
use crate::auth::{ROLE_HEADER, USER_HEADER};
use crate::server::CohortServer;
use crate::{app, ReadinessCheck};

fn router(server: CohortServer, ready: bool) -> Router {
    let (_tx, rx) = tokio::sync::watch::channel(ready);
    app(server, ReadinessCheck::new(rx))
}

fn request(method: &str, uri: &str, user: Uuid, role: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, user.to_string())
        .header(ROLE_HEADER, role);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

fn groupsets_uri(classroom: &ClassroomId) -> String {
    format!("/api/classrooms/{}/groupsets", classroom.0)
}

fn group_uri(classroom: &ClassroomId, set: &GroupSetDetail, index: usize) -> String {
    format!(
        "/api/classrooms/{}/groupsets/{}/groups/{}",
        classroom.0, set.id.0, set.groups[index].id.0
    )
}

#[tokio::test]
async fn missing_identity_is_unauthenticated() {
    let app = router(create_test_server().await, true);
    let req = Request::builder()
        .uri(groupsets_uri(&ClassroomId::new()))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn unknown_role_is_unauthenticated() {
    let app = router(create_test_server().await, true);
    let req = request("GET", &groupsets_uri(&ClassroomId::new()), Uuid::new_v4(), "principal", None);

    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn teacher_creates_group_set() {
    let app = router(create_test_server().await, true);
    let classroom = ClassroomId::new();
    let body = json!({ "name": "Lab Teams", "selfSignup": true, "joinApproval": true, "maxMembers": 4 });

    let (status, body) = send(
        &app,
        request("POST", &groupsets_uri(&classroom), Uuid::new_v4(), "teacher", Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "changed");
    assert_eq!(body["message"], "Group set created");
    assert_eq!(body["data"]["joinApproval"], true);
    assert_eq!(body["data"]["maxMembers"], 4);
    assert_eq!(body["data"]["groups"], json!([]));
}

#[tokio::test]
async fn student_cannot_manage_group_sets() {
    let app = router(create_test_server().await, true);
    let body = json!({ "name": "Lab Teams" });

    let (status, body) = send(
        &app,
        request("POST", &groupsets_uri(&ClassroomId::new()), Uuid::new_v4(), "student", Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["outcome"], "error");
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn validation_and_policy_errors_map_to_status_codes() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, false, Some(1), 1).await;
    let a = enroll(&server, &classroom, "a@school.edu").await;
    let b = enroll(&server, &classroom, "b@school.edu").await;
    let app = router(server, true);

    let (status, body) = send(
        &app,
        request("POST", &groupsets_uri(&classroom), Uuid::new_v4(), "admin", Some(json!({ "name": "  " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["message"], "Name is required");

    let join = format!("{}/join", group_uri(&classroom, &set, 0));
    let (status, _) = send(&app, request("POST", &join, a.0, "student", None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("POST", &join, b.0, "student", None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "policy_violation");
    assert_eq!(body["message"], "Group is full (max 1 members)");
}

#[tokio::test]
async fn noop_update_reports_unchanged() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, false, None, 0).await;
    let app = router(server, true);
    let uri = format!("{}/{}", groupsets_uri(&classroom), set.id.0);

    let (status, body) = send(
        &app,
        request("PUT", &uri, Uuid::new_v4(), "teacher", Some(json!({ "name": "Lab Teams" }))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "unchanged", "message": "No changes were made" }));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, false, None, 0).await;
    let app = router(server, true);
    let uri = format!("{}/{}/groups", groupsets_uri(&classroom), set.id.0);

    let (status, body) = send(
        &app,
        request("POST", &uri, Uuid::new_v4(), "teacher", Some(json!({ "name": "Team", "count": "many" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn malformed_path_id_is_a_json_bad_request() {
    let app = router(create_test_server().await, true);

    let (status, body) = send(
        &app,
        request("GET", "/api/classrooms/not-a-uuid/groupsets", Uuid::new_v4(), "teacher", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "error");
    assert_eq!(body["code"], "bad_request");

    let uri = format!("{}/not-a-uuid/groups", groupsets_uri(&ClassroomId::new()));
    let (status, body) = send(
        &app,
        request("POST", &uri, Uuid::new_v4(), "teacher", Some(json!({ "name": "Team", "count": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn unknown_member_sort_is_a_json_bad_request() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, true, None, 1).await;
    let app = router(server, true);
    let uri = format!("{}/members?sort=bogus", group_uri(&classroom, &set, 0));

    let (status, body) = send(&app, request("GET", &uri, Uuid::new_v4(), "teacher", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "error");
    assert_eq!(body["code"], "bad_request");

    let uri = format!("{}/members?sort=date&status=pending", group_uri(&classroom, &set, 0));
    let (status, body) = send(&app, request("GET", &uri, Uuid::new_v4(), "teacher", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn empty_selection_is_bad_request() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, true, None, 1).await;
    let app = router(server, true);
    let uri = format!("{}/approve", group_uri(&classroom, &set, 0));

    let (status, body) = send(
        &app,
        request("POST", &uri, Uuid::new_v4(), "teacher", Some(json!({ "memberIds": [] }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No members selected");
}

#[tokio::test]
async fn teacher_approves_pending_member_over_http() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let set = create_group_set(&server, &classroom, true, None, 1).await;
    let a = enroll(&server, &classroom, "a@school.edu").await;
    let app = router(server, true);
    let base = group_uri(&classroom, &set, 0);

    let (_, body) = send(&app, request("POST", &format!("{base}/join"), a.0, "student", None)).await;
    assert_eq!(body["message"], "Join request sent, waiting for approval");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("{base}/approve"),
            Uuid::new_v4(),
            "teacher",
            Some(json!({ "memberIds": [a] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Approved 1 member");
    assert_eq!(body["data"]["affected"], 1);
    assert_eq!(body["data"]["group"]["members"][0]["status"], "approved");

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("{base}/members?status=approved&sort=date"),
            a.0,
            "student",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unenrolled_student_cannot_read_classroom() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let app = router(server, true);

    let (status, _) = send(
        &app,
        request("GET", &groupsets_uri(&classroom), StudentId::new().0, "student", None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn group_set_of_another_classroom_is_not_found() {
    let server = create_test_server().await;
    let owner = ClassroomId::new();
    let set = create_group_set(&server, &owner, false, None, 0).await;
    let app = router(server, true);
    let uri = format!("{}/{}", groupsets_uri(&ClassroomId::new()), set.id.0);

    let (status, body) = send(&app, request("GET", &uri, Uuid::new_v4(), "teacher", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn student_leaves_classroom() {
    let server = create_test_server().await;
    let classroom = ClassroomId::new();
    let a = enroll(&server, &classroom, "a@school.edu").await;
    let app = router(server.clone(), true);

    let (status, body) = send(
        &app,
        request("POST", &format!("/api/classrooms/{}/leave", classroom.0), a.0, "student", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "changed");
    assert!(server.list_roster(&classroom).await.unwrap().is_empty());
}

#[tokio::test]
async fn health_routes_report_liveness_and_readiness() {
    let server = create_test_server().await;

    let app = router(server.clone(), true);
    let (status, _) = send(&app, Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let app = router(server, false);
    let (status, _) = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
