//! Event bus abstraction for cohort classroom change notifications.
//!
//! Every event is scoped to one classroom "room". Clients subscribe to the rooms
//! they are viewing and receive the already-populated aggregate that changed.
//! Delivery is best-effort with no replay: a client that reconnects, or that is
//! told to resync, must re-fetch full state.

use std::pin::Pin;

use async_trait::async_trait;
use cohort_storage::{ClassroomId, Enrollment, GroupDetail, GroupId, GroupSetDetail, GroupSetId, StudentId};
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds carried by the generic [`ClassroomEvent::Notification`] channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A student asked to join a group that requires approval.
    JoinRequest,
    /// The subscriber missed events and must re-fetch.
    Resync,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A change pushed to everyone in a classroom room.
///
/// Serialized as `{"event": "<kind>", "data": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClassroomEvent {
    /// The classroom roster changed.
    #[serde(rename_all = "camelCase")]
    ClassroomUpdate {
        classroom_id: ClassroomId,
        students: Vec<Enrollment>,
    },
    GroupsetCreate(GroupSetDetail),
    GroupsetUpdate(GroupSetDetail),
    #[serde(rename_all = "camelCase")]
    GroupsetDelete { group_set_id: GroupSetId },
    #[serde(rename_all = "camelCase")]
    GroupUpdate {
        group_set_id: GroupSetId,
        group: GroupDetail,
    },
    #[serde(rename_all = "camelCase")]
    GroupDelete {
        group_set_id: GroupSetId,
        group_id: GroupId,
    },
    /// A student was removed from (or left) the classroom.
    #[serde(rename_all = "camelCase")]
    ClassroomRemoval {
        classroom_id: ClassroomId,
        student_id: StudentId,
    },
    Notification(Notification),
}

impl ClassroomEvent {
    /// Wire name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            ClassroomEvent::ClassroomUpdate { .. } => "classroom_update",
            ClassroomEvent::GroupsetCreate(_) => "groupset_create",
            ClassroomEvent::GroupsetUpdate(_) => "groupset_update",
            ClassroomEvent::GroupsetDelete { .. } => "groupset_delete",
            ClassroomEvent::GroupUpdate { .. } => "group_update",
            ClassroomEvent::GroupDelete { .. } => "group_delete",
            ClassroomEvent::ClassroomRemoval { .. } => "classroom_removal",
            ClassroomEvent::Notification(_) => "notification",
        }
    }

    pub fn resync(missed: u64) -> Self {
        ClassroomEvent::Notification(Notification {
            kind: NotificationKind::Resync,
            message: format!("Missed {missed} updates, please refresh"),
            payload: serde_json::json!({ "missed": missed }),
        })
    }
}

/// Error type for event bus operations
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of classroom events
pub type EventStream = Pin<Box<dyn Stream<Item = ClassroomEvent> + Send>>;

/// Publish/subscribe over classroom rooms.
///
/// Implementations must deliver events published for one room to a given
/// subscriber in publish order.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to every current subscriber of the classroom room.
    ///
    /// Called only after the change has been committed.
    async fn publish(
        &self,
        classroom_id: &ClassroomId,
        event: ClassroomEvent,
    ) -> Result<(), EventBusError>;

    /// Join a classroom room. The stream ends when dropped.
    async fn subscribe(&self, classroom_id: &ClassroomId) -> Result<EventStream, EventBusError>;
}
