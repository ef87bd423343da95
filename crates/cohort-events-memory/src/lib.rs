//! In-memory event bus implementation using tokio broadcast channels.
//!
//! One broadcast channel per classroom room, created on first use. Events only
//! reach subscribers in the same process.

use std::sync::Arc;

use async_trait::async_trait;
use cohort_events::{ClassroomEvent, EventBus, EventBusError, EventStream};
use cohort_storage::ClassroomId;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

pub struct MemoryEventBus {
    channels: Arc<DashMap<ClassroomId, broadcast::Sender<ClassroomEvent>>>,
    capacity: usize,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the number of events a slow subscriber may fall behind
    /// before it is told to resync. Must be non-zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of live subscribers in a classroom room.
    pub fn subscriber_count(&self, classroom_id: &ClassroomId) -> usize {
        self.channels
            .get(classroom_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn get_or_create_channel(&self, classroom_id: &ClassroomId) -> broadcast::Sender<ClassroomEvent> {
        self.channels
            .entry(*classroom_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(
        &self,
        classroom_id: &ClassroomId,
        event: ClassroomEvent,
    ) -> Result<(), EventBusError> {
        let tx = self.get_or_create_channel(classroom_id);
        let kind = event.name();

        // No receivers is fine: nobody is viewing this classroom.
        let delivered = tx.send(event).unwrap_or(0);
        tracing::debug!(classroom_id = %classroom_id, event = kind, delivered, "published classroom event");

        Ok(())
    }

    async fn subscribe(&self, classroom_id: &ClassroomId) -> Result<EventStream, EventBusError> {
        let rx = self.get_or_create_channel(classroom_id).subscribe();
        let room = *classroom_id;

        // A lagged receiver gets one resync notice in place of what it dropped.
        let stream = BroadcastStream::new(rx).map(move |result| match result {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!(classroom_id = %room, missed, "subscriber lagged, sending resync");
                ClassroomEvent::resync(missed)
            }
        });

        Ok(Box::pin(stream))
    }
}
