//! Event Bus implementation.
//!
//! A table of synchronous handlers keyed by subscription. Owners share a bus
//! through `Arc<EventBus>`; handlers run on the publishing thread in the
//! order events are published.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Which events a subscriber wants to see
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Events in any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Arc<dyn Fn(AppEvent) + Send + Sync>;

struct Subscription {
    filter: EventFilter,
    handler: EventHandler,
}

/// Publish/subscribe hub shared by the controller, the settings store and
/// their observers
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every matching handler.
    ///
    /// Handlers are collected before any of them runs, so a handler may
    /// subscribe or unsubscribe without deadlocking. Returns the number of
    /// handlers called.
    pub fn publish(&self, event: AppEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .read()
            .values()
            .filter(|sub| sub.filter.matches(&event))
            .map(|sub| Arc::clone(&sub.handler))
            .collect();

        tracing::trace!(
            "Publishing {} to {} handler(s)",
            event.description(),
            handlers.len()
        );
        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }

    /// Register `handler` for events accepted by `filter`.
    ///
    /// The handler runs on the publishing thread and should return quickly.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.subscriptions.write().insert(
            id,
            Subscription {
                filter,
                handler: Arc::new(handler),
            },
        );
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Returns true if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{FileEvent, SettingsEvent};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn changed(revision: u64) -> AppEvent {
        AppEvent::Settings(SettingsEvent::DowelSettingsChanged {
            revision,
            segments: 14,
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(changed(1)), 0);
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let settings_count = Arc::new(AtomicUsize::new(0));
        let file_count = Arc::new(AtomicUsize::new(0));

        let sc = settings_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Settings]),
            move |_| {
                sc.fetch_add(1, Ordering::SeqCst);
            },
        );

        let fc = file_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::File]),
            move |_| {
                fc.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(bus.publish(changed(1)), 1);
        bus.publish(changed(2));
        bus.publish(AppEvent::File(FileEvent::ProgramInstalled {
            path: PathBuf::from("out.gcode"),
            lines: 16,
        }));

        assert_eq!(settings_count.load(Ordering::SeqCst), 2);
        assert_eq!(file_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(parking_lot::Mutex::new(None));

        let (inner_bus, inner_calls, inner_slot) = (bus.clone(), calls.clone(), slot.clone());
        let id = bus.subscribe(EventFilter::All, move |_| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = inner_slot.lock().take() {
                inner_bus.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        bus.publish(changed(1));
        bus.publish(changed(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
