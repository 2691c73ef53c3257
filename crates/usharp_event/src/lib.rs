//! # usharp_event - Multicast Events
//!
//! Synchronous multicast events in the style of engine delegates:
//! - Handlers run on the broadcasting thread, in subscription order
//! - `subscribe` returns a [`Subscription`] token; handing it back to
//!   `unsubscribe` is the only way to detach
//! - Handlers may broadcast, subscribe or unsubscribe re-entrantly

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide so a token can never match a dispatcher it didn't come from
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Capability to detach a handler from the event it was registered on
#[must_use = "dropping a Subscription leaves the handler attached with no way to detach it"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: SubscriberId,
    event: &'static str,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Name of the event this subscription belongs to
    pub fn event(&self) -> &'static str {
        self.event
    }
}

/// Event handler function type
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A named multicast event carrying payloads of type `E`
pub struct EventDispatcher<E> {
    name: &'static str,
    handlers: RwLock<Vec<(SubscriberId, EventHandler<E>)>>,
}

impl<E> EventDispatcher<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attach a handler
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId::next();
        self.handlers.write().push((id, Arc::new(handler)));
        log::trace!("Subscribed {:?} to '{}'", id, self.name);

        Subscription {
            id,
            event: self.name,
        }
    }

    /// Detach the handler behind `subscription`.
    ///
    /// Returns false if the token belongs to another event.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription.id);

        let removed = handlers.len() != before;
        if !removed {
            log::warn!(
                "Subscription {:?} does not belong to event '{}' (it was issued by '{}')",
                subscription.id,
                self.name,
                subscription.event
            );
        }
        removed
    }

    /// Whether `subscription` is currently attached here
    pub fn is_subscribed(&self, subscription: &Subscription) -> bool {
        self.handlers.read().iter().any(|(id, _)| *id == subscription.id)
    }

    /// Run every attached handler with `event`, returning how many ran.
    ///
    /// Handlers attached while broadcasting are not called for this event.
    pub fn broadcast(&self, event: &E) -> usize {
        // Snapshot so handlers can touch this dispatcher re-entrantly
        let handlers: Vec<EventHandler<E>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_bound(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl<E> fmt::Debug for EventDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_broadcast_in_subscription_order() {
        let event = EventDispatcher::<u32>::new("numbers");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = Arc::clone(&seen);
            event.subscribe(move |n: &u32| seen.lock().push(("first", *n)))
        };
        let second = {
            let seen = Arc::clone(&seen);
            event.subscribe(move |n: &u32| seen.lock().push(("second", *n)))
        };

        assert_eq!(event.broadcast(&7), 2);
        assert_eq!(*seen.lock(), vec![("first", 7), ("second", 7)]);

        assert!(event.unsubscribe(first));
        assert_eq!(event.broadcast(&8), 1);
        assert_eq!(seen.lock().last(), Some(&("second", 8)));

        assert!(event.unsubscribe(second));
        assert!(!event.is_bound());
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let a = EventDispatcher::<()>::new("a");
        let b = EventDispatcher::<()>::new("b");

        let token = a.subscribe(|_| {});
        let leaked_id = token.id();
        assert!(!b.unsubscribe(token));
        assert_eq!(a.subscriber_count(), 1);
        assert!(a.handlers.read().iter().any(|(id, _)| *id == leaked_id));
    }

    #[test]
    fn test_reentrant_broadcast_and_subscribe() {
        let event = Arc::new(EventDispatcher::<u32>::new("reentrant"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let late_tokens = Arc::new(Mutex::new(Vec::new()));

        let token = {
            let event_ref = Arc::clone(&event);
            let calls = Arc::clone(&calls);
            let late_tokens = Arc::clone(&late_tokens);
            event.subscribe(move |n: &u32| {
                calls.lock().push(*n);
                if *n > 0 {
                    late_tokens.lock().push(event_ref.subscribe(|_| {}));
                    event_ref.broadcast(&(n - 1));
                }
            })
        };

        event.broadcast(&2);
        assert_eq!(*calls.lock(), vec![2, 1, 0]);
        assert_eq!(event.subscriber_count(), 3);

        assert!(event.unsubscribe(token));
        for late in late_tokens.lock().drain(..) {
            assert!(event.unsubscribe(late));
        }
        assert_eq!(event.subscriber_count(), 0);
    }
}
