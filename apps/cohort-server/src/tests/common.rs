//! Common test helpers for server tests.

use std::sync::Arc;
use std::time::Duration;

use cohort_events::{ClassroomEvent, EventStream};
use cohort_events_memory::MemoryEventBus;
use cohort_storage::{ClassroomId, GroupSetDetail, StudentId};
use cohort_store_sqlite::SqliteStore;
use futures::StreamExt;

use crate::config::ServerConfig;
use crate::server::CohortServer;
use crate::service::{CreateGroupSetRequest, CreateGroupsRequest, EnrollRequest};

/// Test helper: Create a CohortServer with in-memory SQLite
pub async fn create_test_server() -> CohortServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let events = Arc::new(MemoryEventBus::new());
    CohortServer::new(store, events, ServerConfig::default())
}

/// Test helper: Enroll a fresh student in the classroom
pub async fn enroll(server: &CohortServer, classroom: &ClassroomId, email: &str) -> StudentId {
    let student = StudentId::new();
    server
        .enroll_student(
            classroom,
            &student,
            EnrollRequest {
                email: email.to_string(),
                name: None,
            },
        )
        .await
        .unwrap();
    student
}

/// Test helper: Create a group set with `groups` groups named "Team 1".."Team n"
pub async fn create_group_set(
    server: &CohortServer,
    classroom: &ClassroomId,
    join_approval: bool,
    max_members: Option<i64>,
    groups: i64,
) -> GroupSetDetail {
    let outcome = server
        .create_group_set(
            classroom,
            CreateGroupSetRequest {
                name: "Lab Teams".to_string(),
                self_signup: true,
                join_approval,
                max_members,
                image: None,
            },
        )
        .await
        .unwrap();
    let set = outcome.value().unwrap().clone();
    if groups == 0 {
        return set;
    }

    let outcome = server
        .create_groups(
            classroom,
            &set.id,
            CreateGroupsRequest {
                name: "Team".to_string(),
                count: groups,
            },
        )
        .await
        .unwrap();
    outcome.value().unwrap().clone()
}

/// Test helper: Join a classroom room
pub async fn subscribe(server: &CohortServer, classroom: &ClassroomId) -> EventStream {
    server.events.subscribe(classroom).await.unwrap()
}

/// Test helper: Next event, failing the test if none arrives promptly
pub async fn next_event(stream: &mut EventStream) -> ClassroomEvent {
    tokio::time::timeout(Duration::from_millis(200), stream.next())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

/// Test helper: Assert that nothing was published
pub async fn assert_no_event(stream: &mut EventStream) {
    let result = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
    assert!(result.is_err(), "unexpected event: {:?}", result.ok().flatten());
}
