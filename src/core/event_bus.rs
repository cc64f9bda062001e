use std::sync::mpsc::{self, Receiver, Sender};

use crate::core::events::{CallEvent, EventKind};

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&CallEvent) + Send>;

enum Delivery {
    Callback(Callback),
    Channel(Sender<CallEvent>),
}

struct Listener {
    id: ListenerId,
    filter: Option<EventKind>,
    delivery: Delivery,
}

/// Named-event fan-out. Listeners run synchronously inside `emit`, in
/// registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, filter: Option<EventKind>, delivery: Delivery) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            filter,
            delivery,
        });
        id
    }

    /// Calls `f` for every event of `kind`.
    pub fn on(&mut self, kind: EventKind, f: impl FnMut(&CallEvent) + Send + 'static) -> ListenerId {
        self.register(Some(kind), Delivery::Callback(Box::new(f)))
    }

    /// Calls `f` for every event.
    pub fn on_any(&mut self, f: impl FnMut(&CallEvent) + Send + 'static) -> ListenerId {
        self.register(None, Delivery::Callback(Box::new(f)))
    }

    /// Channel subscription, for `kind` only or for everything. Dropping the
    /// receiver unsubscribes on the next emit.
    pub fn subscribe(&mut self, kind: Option<EventKind>) -> (ListenerId, Receiver<CallEvent>) {
        let (tx, rx) = mpsc::channel();
        let id = self.register(kind, Delivery::Channel(tx));
        (id, rx)
    }

    /// Returns whether `id` was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn remove_all(&mut self) {
        self.listeners.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &CallEvent) {
        let kind = event.kind();
        self.listeners.retain_mut(|l| {
            if l.filter.is_some_and(|k| k != kind) {
                return true;
            }
            match &mut l.delivery {
                Delivery::Callback(f) => {
                    f(event);
                    true
                }
                Delivery::Channel(tx) => tx.send(event.clone()).is_ok(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn delivers_in_registration_order_with_filters() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let s = seen.clone();
        bus.on_any(move |e| s.lock().unwrap().push(format!("any:{}", e.name())));
        let s = seen.clone();
        bus.on(EventKind::Destroyed, move |e| {
            s.lock().unwrap().push(format!("destroyed:{}", e.name()));
        });

        bus.emit(&CallEvent::ScreenShareStopped);
        bus.emit(&CallEvent::Destroyed);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "any:screenShareStopped",
                "any:destroyed",
                "destroyed:destroyed"
            ]
        );
    }

    #[test]
    fn off_and_remove_all() {
        let count = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus.on_any(move |_| *c.lock().unwrap() += 1);

        bus.emit(&CallEvent::Destroyed);
        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&CallEvent::Destroyed);
        assert_eq!(*count.lock().unwrap(), 1);

        bus.on_any(|_| {});
        bus.remove_all();
        assert!(bus.is_empty());
    }

    #[test]
    fn channel_subscribers_are_pruned_when_dropped() {
        let mut bus = EventBus::new();
        let (_, rx) = bus.subscribe(Some(EventKind::VideoToggled));
        let (_, gone) = bus.subscribe(None);
        drop(gone);

        bus.emit(&CallEvent::AudioToggled { enabled: true });
        bus.emit(&CallEvent::VideoToggled { enabled: false });

        assert!(matches!(
            rx.try_recv().unwrap(),
            CallEvent::VideoToggled { enabled: false }
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(bus.len(), 1);
    }
}
