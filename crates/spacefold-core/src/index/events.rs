use serde::Serialize;

/// Change notification published by the index after a mutation lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexEvent {
    /// A path's state (including its space set) was written.
    PathStateUpdated { path: String },
    /// A space definition was added or replaced.
    SpaceStateUpdated { space: String },
    SpaceDeleted { space: String },
    /// A space's member set changed.
    SpaceChanged { space: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn Fn(&IndexEvent) + Send + Sync>;

/// Synchronous fan-out. Subscribers run in registration order on the
/// mutating thread and only see events published after they subscribed.
#[derive(Default)]
pub(super) struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub(super) fn subscribe(&mut self, subscriber: Subscriber) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, subscriber));
        id
    }

    pub(super) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub(super) fn publish(&self, event: &IndexEvent) {
        for (_, subscriber) in &self.subscribers {
            subscriber(event);
        }
    }
}
