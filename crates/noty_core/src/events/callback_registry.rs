//! Callback registry for typed event subscriptions.
//!
//! Subscribers receive every event emitted on the registry. Delivery is
//! synchronous and the order across subscribers is unspecified.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, PoisonError, RwLock};

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for events of type `E`.
///
/// Callbacks receive a reference to the event and should not block for extended periods.
pub type EventCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry for managing event subscriptions.
///
/// The registry supports:
/// - Subscribing to events with unique IDs
/// - Unsubscribing by ID
/// - Emitting events to all active subscribers
///
/// # Example
///
/// ```ignore
/// use noty_core::events::{CallbackRegistry, StoreEvent};
/// use std::sync::Arc;
///
/// let registry = CallbackRegistry::<StoreEvent>::new();
///
/// let id = registry.subscribe(Arc::new(|event| {
///     println!("Event: {:?}", event);
/// }));
///
/// registry.emit(&StoreEvent::NotesReloaded { count: 3 });
///
/// registry.unsubscribe(id);
/// ```
pub struct CallbackRegistry<E> {
    /// Map of subscription IDs to callbacks.
    callbacks: RwLock<HashMap<SubscriptionId, EventCallback<E>>>,
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
}

impl<E> CallbackRegistry<E> {
    /// Create a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to events.
    ///
    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: EventCallback<E>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        callbacks.insert(id, callback);
        id
    }

    /// Unsubscribe from events.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        callbacks.remove(&id).is_some()
    }

    /// Emit an event to all registered callbacks.
    ///
    /// Callbacks are invoked synchronously in an undefined order.
    /// If a callback panics, it does not affect other callbacks.
    pub fn emit(&self, event: &E) {
        let callbacks = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.values() {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
        }
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are any active subscriptions.
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Clear all subscriptions.
    pub fn clear(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<E: Clone + Send + 'static> CallbackRegistry<E> {
    /// Subscribe with a channel instead of a callback.
    ///
    /// Every emitted event is cloned into the returned receiver, which the caller
    /// drains from its own loop. The subscription silently stops delivering once
    /// the receiver is dropped.
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<E>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(Arc::new(move |event: &E| {
            let _ = tx.send(event.clone());
        }));
        (id, rx)
    }
}

impl<E> Default for CallbackRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for CallbackRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StoreEvent;
    use std::sync::atomic::AtomicUsize;

    fn reloaded() -> StoreEvent {
        StoreEvent::NotesReloaded { count: 1 }
    }

    #[test]
    fn test_subscribe_and_emit() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _id = registry.subscribe(Arc::new(move |_event: &StoreEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(registry.subscriber_count(), 1);

        registry.emit(&reloaded());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let id = registry.subscribe(Arc::new(move |_event: &StoreEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert_eq!(registry.subscriber_count(), 0);

        registry.emit(&reloaded());

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multiple_subscribers() {
        let registry = CallbackRegistry::new();
        let counter1 = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&counter1);
        registry.subscribe(Arc::new(move |_event: &StoreEvent| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter2);
        registry.subscribe(Arc::new(move |_event: &StoreEvent| {
            c2.fetch_add(1, Ordering::SeqCst);
        }));

        registry.emit(&reloaded());

        assert_eq!(counter1.load(Ordering::SeqCst), 1);
        assert_eq!(counter2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_panic_isolation() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.subscribe(Arc::new(|_: &StoreEvent| {
            panic!("Test panic");
        }));

        let counter_clone = Arc::clone(&counter);
        registry.subscribe(Arc::new(move |_: &StoreEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        registry.emit(&reloaded());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_subscription() {
        let registry = CallbackRegistry::new();
        let (_id, rx) = registry.subscribe_channel();

        registry.emit(&reloaded());
        registry.emit(&StoreEvent::NotesReloaded { count: 2 });

        let received: Vec<StoreEvent> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1], StoreEvent::NotesReloaded { count: 2 });

        drop(rx);
        // a dropped receiver must not break emission
        registry.emit(&reloaded());
    }

    #[test]
    fn test_clear() {
        let registry = CallbackRegistry::<StoreEvent>::new();
        registry.subscribe(Arc::new(|_: &StoreEvent| {}));
        registry.subscribe(Arc::new(|_: &StoreEvent| {}));
        registry.clear();
        assert!(!registry.has_subscribers());
    }
}
