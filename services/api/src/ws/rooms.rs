//! Per-event broadcast rooms

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::debug;
use uuid::Uuid;

use super::{ROOM_CHANNEL_CAPACITY, ServerEvent};

/// Broadcast channel per event id
///
/// Rooms are created on first subscription and dropped when a publish finds
/// no receivers left. Delivery is fire-and-forget; slow subscribers lag and
/// lose frames rather than exerting backpressure.
#[derive(Clone, Default)]
pub struct EventRooms {
    channels: Arc<DashMap<Uuid, Sender<Arc<ServerEvent>>>>,
}

impl EventRooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event's room, creating it if needed
    ///
    /// Creation goes through the entry API so that concurrent first
    /// subscribers end up on the same channel instead of one insert
    /// overwriting the other's sender.
    pub fn subscribe(&self, event_id: Uuid) -> Receiver<Arc<ServerEvent>> {
        self.channels
            .entry(event_id)
            .or_insert_with(|| {
                debug!(%event_id, "creating broadcast room");
                broadcast::channel(ROOM_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    /// Publish an event into a room; returns the number of receivers reached
    pub fn publish(&self, event_id: Uuid, event: ServerEvent) -> usize {
        let Some(tx) = self.channels.get(&event_id) else {
            return 0;
        };

        let reached = tx.send(Arc::new(event)).unwrap_or(0);
        drop(tx);

        if reached == 0 {
            // re-checked under the map lock: a subscriber that arrived
            // since the failed send keeps the room alive
            let removed = self
                .channels
                .remove_if(&event_id, |_, tx| tx.receiver_count() == 0);
            if removed.is_some() {
                debug!(%event_id, "room has no receivers, dropping it");
            }
        }

        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing_frame() -> ServerEvent {
        ServerEvent::UserTyping {
            user_id: Uuid::new_v4(),
            is_typing: true,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_frame() {
        let rooms = EventRooms::new();
        let event_id = Uuid::new_v4();

        let mut rx = rooms.subscribe(event_id);
        assert_eq!(rooms.publish(event_id, typing_frame()), 1);

        let frame = rx.recv().await.unwrap();
        assert!(matches!(frame.as_ref(), ServerEvent::UserTyping { .. }));
    }

    #[tokio::test]
    async fn publish_without_room_reaches_nobody() {
        let rooms = EventRooms::new();
        assert_eq!(rooms.publish(Uuid::new_v4(), typing_frame()), 0);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let rooms = EventRooms::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut rx_a = rooms.subscribe(a);
        let _rx_b = rooms.subscribe(b);

        rooms.publish(b, typing_frame());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn all_room_subscribers_are_reached() {
        let rooms = EventRooms::new();
        let event_id = Uuid::new_v4();

        let _rx1 = rooms.subscribe(event_id);
        let _rx2 = rooms.subscribe(event_id);

        assert_eq!(rooms.publish(event_id, typing_frame()), 2);
    }

    #[tokio::test]
    async fn concurrent_first_subscribers_share_one_channel() {
        let rooms = EventRooms::new();
        let event_id = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let rooms = rooms.clone();
                tokio::spawn(async move { rooms.subscribe(event_id) })
            })
            .collect();

        let mut receivers = Vec::new();
        for handle in handles {
            receivers.push(handle.await.unwrap());
        }

        // every receiver hangs off the same sender, none got orphaned
        assert_eq!(rooms.publish(event_id, typing_frame()), receivers.len());
        for mut rx in receivers {
            assert!(rx.recv().await.is_ok());
        }
    }

    #[tokio::test]
    async fn room_is_dropped_after_last_receiver() {
        let rooms = EventRooms::new();
        let event_id = Uuid::new_v4();

        let rx = rooms.subscribe(event_id);
        drop(rx);

        assert_eq!(rooms.publish(event_id, typing_frame()), 0);
        // room was removed; a fresh subscribe recreates it
        let _rx = rooms.subscribe(event_id);
        assert_eq!(rooms.publish(event_id, typing_frame()), 1);
    }
}
