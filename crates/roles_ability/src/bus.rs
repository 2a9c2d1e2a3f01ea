//! Event sources and the in-process event bus.
//!
//! An [`EventSource`] is anything abilities can register an observer with:
//! `subscribe` hands back a [`SubscriptionId`] token and `unsubscribe` takes
//! it back. The host owns one source per payload type. [`EventBus`] is the
//! stock in-memory implementation.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;
use uuid::Uuid;

use crate::event::PlayerEvent;

/// Callback invoked for every occurrence published on a source.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Token returned by [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generate a fresh, unique token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observer registration for one event payload type.
///
/// Unsubscribing a token that is no longer registered is a no-op. Sources do
/// not deduplicate handlers; callers that must not subscribe twice keep track
/// of their own token.
pub trait EventSource<E: PlayerEvent>: Send + Sync {
    /// Register `handler`; it runs for every subsequent occurrence.
    fn subscribe(&self, handler: Handler<E>) -> SubscriptionId;

    /// Remove a registration. Returns `true` if the token was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-memory [`EventSource`] that dispatches synchronously on the
/// publishing thread.
///
/// Handlers run in subscription order, outside the registration lock, so a
/// handler may itself subscribe or unsubscribe (including its own token)
/// while an occurrence is being delivered. Such changes take effect from the
/// next `publish`.
pub struct EventBus<E: PlayerEvent> {
    handlers: RwLock<Vec<(SubscriptionId, Handler<E>)>>,
}

impl<E: PlayerEvent> EventBus<E> {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<Handler<E>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        trace!(
            event = E::event_name(),
            player = %event.player(),
            subscribers = snapshot.len(),
            "publishing event"
        );

        for handler in &snapshot {
            handler(event);
        }
        snapshot.len()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl<E: PlayerEvent> EventSource<E> for EventBus<E> {
    fn subscribe(&self, handler: Handler<E>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.handlers.write().push((id, handler));
        trace!(event = E::event_name(), subscription = %id, "subscribed");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().position(|(existing, _)| *existing == id) {
            Some(pos) => {
                handlers.remove(pos);
                trace!(event = E::event_name(), subscription = %id, "unsubscribed");
                true
            }
            None => false,
        }
    }
}

impl<E: PlayerEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PlayerEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event", &E::event_name())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
